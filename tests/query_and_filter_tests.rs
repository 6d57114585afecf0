// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Key queries over indexed events and the log filter lifecycle

mod helpers;

use std::time::Duration;

use alloy_primitives::{address, Address, B256, U256};
use evm_contract_reader::query::{
    ComparisonOperator, Expression, HashedValueComparator, KeyFilter, LimitAndSort, LogPrimitive,
    Primitive, ValueComparator,
};
use evm_contract_reader::{ChainReaderConfig, ConfidenceLevel, Confirmations, IndexedLog, Sequence};
use helpers::{
    bound_token, transfer_log, transfer_sig, FilterCall, Harness, MockLogIndexer, MockRpcClient,
    TOKEN_ABI,
};
use serde_json::{json, Value};

const TOKEN: Address = address!("1111111111111111111111111111111111111111");
const OTHER_TOKEN: Address = address!("2222222222222222222222222222222222222222");
const SENDER: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
const ALICE: Address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
const BOB: Address = address!("cccccccccccccccccccccccccccccccccccccccc");

fn transfers() -> Vec<IndexedLog> {
    vec![
        transfer_log(TOKEN, SENDER, ALICE, 300, 4, 1),
        transfer_log(TOKEN, SENDER, ALICE, 100, 5, 3),
        transfer_log(TOKEN, SENDER, ALICE, 600, 6, 0),
        transfer_log(TOKEN, SENDER, BOB, 700, 7, 0),
        transfer_log(OTHER_TOKEN, SENDER, ALICE, 900, 8, 0),
    ]
}

async fn bound_harness() -> Harness {
    let harness = Harness::token(MockRpcClient::returning(1), MockLogIndexer::with_logs(transfers()));
    harness.service.bind(&[bound_token(TOKEN)]).await.unwrap();
    harness
}

fn amounts(sequences: &[Sequence<Value>]) -> Vec<Value> {
    sequences.iter().map(|s| s.data["value"].clone()).collect()
}

#[tokio::test]
async fn test_query_key_by_generic_topic() {
    let harness = bound_harness().await;
    let filter = KeyFilter::new("Transfer")
        .with_expression(Primitive::field_eq("To", json!(ALICE.to_string())));

    let sequences: Vec<Sequence<Value>> = harness
        .service
        .query_key(&bound_token(TOKEN), &filter, &LimitAndSort::default())
        .await
        .unwrap();

    assert_eq!(amounts(&sequences), vec![json!("300"), json!("100"), json!("600")]);
    assert_eq!(sequences[0].head.identifier, "4");
    assert_eq!(sequences[0].head.number(), Some(4));
    assert_eq!(
        sequences[0].cursor,
        format!("4-1-{}", B256::with_last_byte(101))
    );

    let (expressions, query_name) = harness.indexer.queries().pop().unwrap();
    assert_eq!(query_name, format!("Token-{TOKEN}-Transfer"));
    assert_eq!(
        expressions,
        vec![
            Expression::Primitive(LogPrimitive::Address(TOKEN)),
            Expression::Primitive(LogPrimitive::EventSig(transfer_sig())),
            Expression::Primitive(LogPrimitive::EventByTopic {
                topic: 2,
                value_comparators: vec![HashedValueComparator::equal_to(ALICE.into_word())],
            }),
        ]
    );
}

#[tokio::test]
async fn test_query_key_by_data_word_and_confidence() {
    let harness = bound_harness().await;
    let filter = KeyFilter::new("Transfer")
        .with_expression(Primitive::Comparator {
            name: "Amount".to_string(),
            value_comparators: vec![ValueComparator {
                value: json!(200),
                operator: ComparisonOperator::Gt,
            }],
        })
        .with_expression(Primitive::Confidence(ConfidenceLevel::Finalized));

    let sequences: Vec<Sequence<Value>> = harness
        .service
        .query_key(&bound_token(TOKEN), &filter, &LimitAndSort::default())
        .await
        .unwrap();
    assert_eq!(amounts(&sequences), vec![json!("300"), json!("600"), json!("700")]);

    let (expressions, _) = harness.indexer.queries().pop().unwrap();
    assert_eq!(
        expressions[2],
        Expression::Primitive(LogPrimitive::EventByWord {
            word_index: 0,
            value_comparators: vec![HashedValueComparator {
                value: B256::from(U256::from(200)),
                operator: ComparisonOperator::Gt,
            }],
        })
    );
    assert_eq!(
        expressions[3],
        Expression::Primitive(LogPrimitive::Confirmations(Confirmations::Finalized))
    );
}

#[tokio::test]
async fn test_query_key_or_expression_keeps_shape() {
    let harness = bound_harness().await;
    let filter = KeyFilter::new("Transfer").with_expression(Expression::Or(vec![
        Primitive::field_eq("To", json!(BOB.to_string())).into(),
        Primitive::Block {
            block: 4,
            operator: ComparisonOperator::Eq,
        }
        .into(),
    ]));

    let sequences: Vec<Sequence<Value>> = harness
        .service
        .query_key(&bound_token(TOKEN), &filter, &LimitAndSort::default())
        .await
        .unwrap();
    assert_eq!(amounts(&sequences), vec![json!("300"), json!("700")]);
}

#[tokio::test]
async fn test_query_key_without_matches_is_empty() {
    let harness = bound_harness().await;
    let filter = KeyFilter::new("Transfer")
        .with_expression(Primitive::field_eq("To", json!(SENDER.to_string())));

    let sequences: Vec<Sequence<Value>> = harness
        .service
        .query_key(&bound_token(TOKEN), &filter, &LimitAndSort::default())
        .await
        .unwrap();
    assert!(sequences.is_empty());
}

#[tokio::test]
async fn test_query_key_rejects_unknown_fields_and_addresses() {
    let harness = bound_harness().await;

    let filter = KeyFilter::new("Transfer").with_expression(Primitive::field_eq("Memo", json!("x")));
    let err = harness
        .service
        .query_key::<Value>(&bound_token(TOKEN), &filter, &LimitAndSort::default())
        .await
        .unwrap_err();
    assert!(err.is_config());

    let err = harness
        .service
        .query_key::<Value>(
            &bound_token(OTHER_TOKEN),
            &KeyFilter::new("Transfer"),
            &LimitAndSort::default(),
        )
        .await
        .unwrap_err();
    assert!(err.is_config());

    let err = harness
        .service
        .query_key::<Value>(
            &bound_token(TOKEN),
            &KeyFilter::new("Approval"),
            &LimitAndSort::default(),
        )
        .await
        .unwrap_err();
    assert!(err.is_config());
}

#[tokio::test]
async fn test_query_key_on_method_is_empty() {
    let harness = bound_harness().await;
    let sequences: Vec<Sequence<Value>> = harness
        .service
        .query_key(
            &bound_token(TOKEN),
            &KeyFilter::new("decimals"),
            &LimitAndSort::default(),
        )
        .await
        .unwrap();
    assert!(sequences.is_empty());
}

#[tokio::test]
async fn test_filters_wait_for_start_and_addresses() {
    let harness = Harness::token(MockRpcClient::returning(1), MockLogIndexer::default());

    harness.service.start().await.unwrap();
    assert!(harness.indexer.filter_calls().is_empty());

    harness.service.bind(&[bound_token(TOKEN)]).await.unwrap();
    assert_eq!(
        harness.indexer.filter_calls(),
        vec![FilterCall::Registered("Token".to_string())]
    );
    let filter = harness.indexer.filter("Token").unwrap();
    assert_eq!(filter.addresses, vec![TOKEN]);
    assert_eq!(filter.event_sigs, vec![transfer_sig()]);
}

#[tokio::test]
async fn test_bind_before_start_defers_registration() {
    let harness = Harness::token(MockRpcClient::returning(1), MockLogIndexer::default());

    harness.service.bind(&[bound_token(TOKEN)]).await.unwrap();
    assert!(harness.indexer.filter_calls().is_empty());

    harness.service.start().await.unwrap();
    harness.service.close().await.unwrap();
    assert_eq!(
        harness.indexer.filter_calls(),
        vec![
            FilterCall::Registered("Token".to_string()),
            FilterCall::Unregistered("Token".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_rebind_replaces_filter_once() {
    let harness = Harness::token(MockRpcClient::returning(1), MockLogIndexer::default());
    harness.service.start().await.unwrap();

    harness.service.bind(&[bound_token(TOKEN)]).await.unwrap();
    harness.service.bind(&[bound_token(OTHER_TOKEN)]).await.unwrap();
    assert_eq!(
        harness.indexer.filter_calls(),
        vec![
            FilterCall::Registered("Token".to_string()),
            FilterCall::Unregistered("Token".to_string()),
            FilterCall::Registered("Token".to_string()),
        ]
    );
    assert_eq!(
        harness.indexer.filter("Token").unwrap().addresses,
        vec![TOKEN, OTHER_TOKEN]
    );

    // Binding an already bound address changes nothing
    harness.service.bind(&[bound_token(TOKEN)]).await.unwrap();
    assert_eq!(harness.indexer.filter_calls().len(), 3);
}

#[tokio::test]
async fn test_unbind_shrinks_then_drops_filter() {
    let harness = Harness::token(MockRpcClient::returning(1), MockLogIndexer::default());
    harness.service.start().await.unwrap();
    harness
        .service
        .bind(&[bound_token(TOKEN), bound_token(OTHER_TOKEN)])
        .await
        .unwrap();

    harness.service.unbind(&[bound_token(TOKEN)]).await.unwrap();
    assert_eq!(
        harness.indexer.filter("Token").unwrap().addresses,
        vec![OTHER_TOKEN]
    );

    harness.service.unbind(&[bound_token(OTHER_TOKEN)]).await.unwrap();
    assert!(harness.indexer.filter("Token").is_none());
    assert_eq!(
        harness.indexer.filter_calls(),
        vec![
            FilterCall::Registered("Token".to_string()),
            FilterCall::Unregistered("Token".to_string()),
            FilterCall::Registered("Token".to_string()),
            FilterCall::Unregistered("Token".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_polling_filter_is_private() {
    let config: ChainReaderConfig = serde_json::from_value(json!({
        "contracts": {
            "Token": {
                "contractAbi": TOKEN_ABI,
                "configs": {
                    "decimals": {"chainSpecificName": "decimals"},
                    "Transfer": {
                        "chainSpecificName": "Transfer",
                        "readType": "event",
                        "eventDefinitions": {
                            "pollingFilter": {"retention": 3600, "maxLogsKept": 50}
                        }
                    }
                }
            }
        }
    }))
    .unwrap();
    let harness = Harness::new(&config, MockRpcClient::returning(1), MockLogIndexer::default());
    harness.service.start().await.unwrap();
    harness.service.bind(&[bound_token(TOKEN)]).await.unwrap();

    // The contract filter has no events left, so only the private one exists
    assert_eq!(
        harness.indexer.filter_calls(),
        vec![FilterCall::Registered("Token - Transfer".to_string())]
    );
    let filter = harness.indexer.filter("Token - Transfer").unwrap();
    assert_eq!(filter.addresses, vec![TOKEN]);
    assert_eq!(filter.event_sigs, vec![transfer_sig()]);
    assert_eq!(filter.retention, Some(Duration::from_secs(3600)));
    assert_eq!(filter.max_logs_kept, 50);
}

#[tokio::test]
async fn test_output_modifiers_apply_to_events() {
    let config: ChainReaderConfig = serde_json::from_value(json!({
        "contracts": {
            "Token": {
                "contractAbi": TOKEN_ABI,
                "configs": {
                    "Transfer": {
                        "chainSpecificName": "Transfer",
                        "readType": "event",
                        "outputModifications": [
                            {"type": "rename", "fields": {"value": "Amount"}},
                            {"type": "drop", "fields": ["from"]}
                        ]
                    }
                }
            }
        }
    }))
    .unwrap();
    let harness = Harness::new(
        &config,
        MockRpcClient::returning(1),
        MockLogIndexer::with_logs(transfers()),
    );
    harness.service.bind(&[bound_token(TOKEN)]).await.unwrap();

    let transfer: Value = harness
        .service
        .get_latest_value(
            &bound_token(TOKEN).read_identifier("Transfer"),
            ConfidenceLevel::Unconfirmed,
            &(),
        )
        .await
        .unwrap();
    assert_eq!(
        transfer,
        json!({"to": BOB.to_checksum(None), "Amount": "700"})
    );
}
