/// Contract surface tests
///
/// Drives `WasmModuleContract` the way the router does: direct calls carry the
/// acting identity in `sender`, and only the router account may make them.

use near_sdk::json_types::Base64VecU8;
use near_sdk::test_utils::{accounts, get_logs, VMContextBuilder};
use near_sdk::{testing_env, AccountId};
use serde_json::json;
use x_wasm::address::account_address;
use x_wasm::messages::{BankMsg, WasmCoin, WasmMsg};
use x_wasm::{
    AbsoluteTxPosition, AccessConfig, AccessType, CodeHistoryOperation, CodeID, Coin, CosmosMsg, ModuleConfig,
    NativeMsg, NativeMsgKind, Params, WasmModuleContract,
};

const PREFIX: &str = "proxima";

/// Router is accounts(1), governance accounts(2)
fn context(predecessor: AccountId, block_height: u64) {
    let mut context = VMContextBuilder::new();
    context
        .current_account_id(accounts(0))
        .predecessor_account_id(predecessor)
        .block_height(block_height);
    testing_env!(context.build());
}

fn setup_contract_with_params(params: Params) -> WasmModuleContract {
    context(accounts(1), 100);
    let mut config = ModuleConfig::new(accounts(1), accounts(2));
    config.params = params;
    WasmModuleContract::new(config)
}

fn setup_contract() -> WasmModuleContract {
    setup_contract_with_params(Params::default())
}

/// Identity of a test account as the router would present it
fn identity(index: usize) -> String {
    account_address(&accounts(index), PREFIX).unwrap()
}

fn mock_wasm(tag: u8) -> Base64VecU8 {
    let mut wasm = vec![0x00, 0x61, 0x73, 0x6d]; // \0asm
    wasm.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]); // version 1
    wasm.push(tag);
    Base64VecU8::from(wasm)
}

fn store(contract: &mut WasmModuleContract, sender: &str, permission: Option<AccessConfig>) -> CodeID {
    contract
        .store_code(sender.to_string(), mock_wasm(0), None, None, permission)
        .code_id
}

fn instantiate(contract: &mut WasmModuleContract, sender: &str, code_id: CodeID, admin: Option<String>) -> String {
    contract
        .instantiate(
            sender.to_string(),
            code_id,
            Base64VecU8::from(br#"{"count":0}"#.to_vec()),
            None,
            "counter".to_string(),
            admin,
        )
        .address
}

#[test]
fn test_store_code_returns_id_and_checksum() {
    let mut contract = setup_contract();

    let response = contract.store_code(
        identity(3),
        mock_wasm(1),
        Some("https://github.com/CosmWasm/cw-plus".to_string()),
        Some("cosmwasm/workspace-optimizer:0.12.13".to_string()),
        None,
    );

    assert_eq!(response.code_id, 1);
    let code = contract.get_code(1).unwrap();
    assert_eq!(response.checksum, hex::encode(&code.code_info.code_hash));
    assert_eq!(code.code_bytes, Vec::<u8>::from(mock_wasm(1)));
    assert_eq!(code.code_info.creator, identity(3));
    assert_eq!(code.code_info.source, "https://github.com/CosmWasm/cw-plus");

    assert!(get_logs().iter().any(|log| log == &format!("WASM: stored code 1 from {}", identity(3))));
    assert_eq!(contract.health_check()["next_code_id"], 2);
}

#[test]
#[should_panic(expected = "Only router can call")]
fn test_store_code_requires_router() {
    let mut contract = setup_contract();
    context(accounts(3), 100);
    contract.store_code(identity(3), mock_wasm(1), None, None, None);
}

#[test]
#[should_panic(expected = "empty_code")]
fn test_store_empty_code_fails() {
    let mut contract = setup_contract();
    contract.store_code(identity(3), Base64VecU8::from(vec![]), None, None, None);
}

#[test]
#[should_panic(expected = "unauthorized")]
fn test_upload_access_is_enforced() {
    let mut contract = setup_contract_with_params(Params {
        code_upload_access: AccessConfig::OnlyAddress { address: identity(4) },
        ..Params::default()
    });
    contract.store_code(identity(3), mock_wasm(1), None, None, None);
}

#[test]
fn test_instantiate_positions_within_a_block() {
    let mut contract = setup_contract();
    let code_id = store(&mut contract, &identity(3), None);

    let first = instantiate(&mut contract, &identity(3), code_id, None);
    let second = instantiate(&mut contract, &identity(4), code_id, Some(identity(4)));
    context(accounts(1), 101);
    let third = instantiate(&mut contract, &identity(3), code_id, None);

    let created = |address: &str| contract.get_contract_info(address.to_string()).unwrap().created;
    assert_eq!(created(&first), Some(AbsoluteTxPosition::new(100, 0)));
    assert_eq!(created(&second), Some(AbsoluteTxPosition::new(100, 1)));
    assert_eq!(created(&third), Some(AbsoluteTxPosition::new(101, 0)));

    let info = contract.get_contract_info(second.clone()).unwrap();
    assert_eq!(info.creator, identity(4));
    assert_eq!(info.admin, Some(identity(4)));
    assert_eq!(info.label, "counter");

    let listed = contract.list_contracts_by_code(code_id, None, None);
    assert_eq!(listed.len(), 3);
}

#[test]
fn test_instantiate_with_funds() {
    let mut contract = setup_contract();
    let code_id = store(&mut contract, &identity(3), None);

    let response = contract.instantiate(
        identity(3),
        code_id,
        Base64VecU8::from(b"{}".to_vec()),
        Some(vec![Coin::new("eth", 12), Coin::new("uatom", 5)]),
        "funded".to_string(),
        None,
    );

    let logs = get_logs();
    let event = logs
        .iter()
        .find(|log| log.contains(r#""event":"instantiate""#))
        .unwrap();
    assert!(event.contains(&response.address));
    assert!(event.contains(r#""funds":[{"denom":"eth","amount":"12"},{"denom":"uatom","amount":"5"}]"#));
}

#[test]
#[should_panic(expected = "unauthorized")]
fn test_only_address_code_rejects_other_instantiators() {
    let mut contract = setup_contract();
    let code_id = store(
        &mut contract,
        &identity(3),
        Some(AccessConfig::OnlyAddress { address: identity(3) }),
    );
    instantiate(&mut contract, &identity(4), code_id, None);
}

#[test]
#[should_panic(expected = "code_not_found")]
fn test_instantiate_unknown_code() {
    let mut contract = setup_contract();
    instantiate(&mut contract, &identity(3), 7, None);
}

#[test]
fn test_default_permission_binds_creator() {
    let mut contract = setup_contract_with_params(Params {
        instantiate_default_permission: AccessType::OnlyAddress,
        ..Params::default()
    });
    let code_id = store(&mut contract, &identity(3), None);
    assert_eq!(
        contract.get_code_info(code_id).unwrap().instantiate_config,
        AccessConfig::OnlyAddress { address: identity(3) }
    );

    // The creator may open it up again
    contract.update_instantiate_config(identity(3), code_id, AccessConfig::Everybody {});
    instantiate(&mut contract, &identity(4), code_id, None);
}

#[test]
fn test_migrate_and_admin_flow() {
    let mut contract = setup_contract();
    let v1 = store(&mut contract, &identity(3), None);
    let v2 = store(&mut contract, &identity(3), None);
    let address = instantiate(&mut contract, &identity(3), v1, Some(identity(3)));

    contract.migrate(
        identity(3),
        address.clone(),
        v2,
        Base64VecU8::from(br#"{"version":2}"#.to_vec()),
    );
    let info = contract.get_contract_info(address.clone()).unwrap();
    assert_eq!(info.code_id, v2);
    assert_eq!(info.created, Some(AbsoluteTxPosition::new(100, 0)));

    let history = contract.contract_history(address.clone());
    assert_eq!(
        history.iter().map(|entry| (entry.operation, entry.code_id)).collect::<Vec<_>>(),
        vec![(CodeHistoryOperation::Init, v1), (CodeHistoryOperation::Migrate, v2)]
    );

    contract.update_admin(identity(3), address.clone(), identity(4));
    assert_eq!(contract.get_contract_info(address.clone()).unwrap().admin, Some(identity(4)));

    contract.clear_admin(identity(4), address.clone());
    let info = contract.get_contract_info(address).unwrap();
    assert_eq!(info.admin, None);
    assert_eq!(info.created, Some(AbsoluteTxPosition::new(100, 0)));
}

#[test]
#[should_panic(expected = "unauthorized")]
fn test_migrate_by_non_admin_fails() {
    let mut contract = setup_contract();
    let v1 = store(&mut contract, &identity(3), None);
    let v2 = store(&mut contract, &identity(3), None);
    let address = instantiate(&mut contract, &identity(3), v1, Some(identity(3)));

    contract.migrate(identity(4), address, v2, Base64VecU8::from(b"{}".to_vec()));
}

#[test]
#[should_panic(expected = "unauthorized")]
fn test_cleared_admin_blocks_update() {
    let mut contract = setup_contract();
    let code_id = store(&mut contract, &identity(3), None);
    let address = instantiate(&mut contract, &identity(3), code_id, Some(identity(3)));

    contract.clear_admin(identity(3), address.clone());
    contract.update_admin(identity(3), address, identity(3));
}

#[test]
fn test_contract_state_round_trip() {
    let mut contract = setup_contract();
    let code_id = store(&mut contract, &identity(3), None);
    let address = instantiate(&mut contract, &identity(3), code_id, None);

    let key = Base64VecU8::from(b"config".to_vec());
    contract.set_contract_state(address.clone(), key.clone(), Base64VecU8::from(b"v1".to_vec()));
    assert_eq!(
        contract.query_raw(address.clone(), key.clone()).map(Vec::<u8>::from),
        Some(b"v1".to_vec())
    );

    let full = contract.get_contract(address.clone()).unwrap();
    assert_eq!(full.contract_state.len(), 1);
    assert_eq!(full.contract_info.code_id, code_id);

    let removed = contract.remove_contract_state(address.clone(), key.clone());
    assert_eq!(removed.map(Vec::<u8>::from), Some(b"v1".to_vec()));
    assert!(contract.query_raw(address, key).is_none());
}

#[test]
fn test_encode_messages_view() {
    let contract = setup_contract();
    let sender = identity(3);
    let msgs = vec![
        CosmosMsg::Bank(BankMsg::Send {
            from_address: sender.clone(),
            to_address: identity(4),
            amount: vec![WasmCoin::new("uatom", "12345"), WasmCoin::new("usdt", "54321")],
        }),
        CosmosMsg::Wasm(WasmMsg::Instantiate {
            code_id: 1,
            msg: b"{}".to_vec(),
            send: vec![],
        }),
    ];

    let encoded = contract.encode_messages(sender.clone(), msgs);

    assert_eq!(encoded.len(), 2);
    assert_eq!(encoded[0].kind(), NativeMsgKind::Transfer);
    match &encoded[1] {
        NativeMsg::InstantiateContract(msg) => {
            assert_eq!(msg.sender, sender);
            assert_eq!(msg.label, format!("Auto-created by {}", sender));
        }
        other => panic!("unexpected message {:?}", other),
    }
}

#[test]
#[should_panic(expected = "invalid_amount")]
fn test_encode_messages_rejects_bad_amount() {
    let contract = setup_contract();
    let msgs: Vec<CosmosMsg> = serde_json::from_value(json!([
        {"bank": {"send": {"from_address": identity(3), "to_address": identity(4), "amount": [{"denom": "uatom", "amount": "123.456"}]}}}
    ]))
    .unwrap();
    contract.encode_messages(identity(3), msgs);
}

#[test]
#[should_panic(expected = "unsupported_message_kind: unsupported message kind: stargate")]
fn test_encode_messages_rejects_unmodelled_kind() {
    let contract = setup_contract();
    let msgs: Vec<CosmosMsg> = serde_json::from_value(json!([
        {"bank": {"send": {"from_address": identity(3), "to_address": identity(4), "amount": []}}},
        {"stargate": {"type_url": "/cosmos.gov.v1beta1.MsgVote", "value": "CAE="}}
    ]))
    .unwrap();
    contract.encode_messages(identity(3), msgs);
}

#[test]
fn test_encode_messages_keeps_large_amounts_exact() {
    let contract = setup_contract();
    let msgs: Vec<CosmosMsg> = serde_json::from_value(json!([
        {"bank": {"send": {"from_address": identity(3), "to_address": identity(4), "amount": [{"denom": "uatom", "amount": "9007199254740993"}]}}}
    ]))
    .unwrap();

    let encoded = serde_json::to_value(contract.encode_messages(identity(3), msgs)).unwrap();

    assert_eq!(encoded[0]["value"]["amount"][0]["amount"], "9007199254740993");
    let decoded: Vec<NativeMsg> = serde_json::from_value(encoded).unwrap();
    match &decoded[0] {
        NativeMsg::Send(send) => assert_eq!(send.amount, vec![Coin::new("uatom", 9_007_199_254_740_993)]),
        other => panic!("unexpected message {:?}", other),
    }
}

#[test]
fn test_list_codes_view() {
    let mut contract = setup_contract();
    for _ in 0..3 {
        store(&mut contract, &identity(3), None);
    }
    let page = contract.list_codes(Some(1), Some(1));
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].code_id, 2);
    assert_eq!(page[0].info.creator, identity(3));
}

#[test]
fn test_account_address_view() {
    let contract = setup_contract();
    let address = contract.account_address(accounts(3));
    assert_eq!(address, identity(3));
    assert!(address.starts_with("proxima1"));
}
