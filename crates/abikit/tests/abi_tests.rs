//! ABI integration tests for abikit
//!
//! Tests layout vectors, overflow checks, and agreement between the JSON and
//! human-readable front ends.

use abikit::abi::{decode, encode, tokenize, DecodeOptions, ParamType, Token};
use abikit::human_readable::{parse_abi, parse_signature, parse_type};
use abikit::{Abi, AbiError, AbiItemKind, Address, U256};

fn word(value: u64) -> String {
    format!("{:064x}", value)
}

fn text_word(text: &str) -> String {
    format!("{:0<64}", hex::encode(text))
}

// ==================== Layout Tests ====================

#[test]
fn test_dynamic_classification() {
    let cases = [
        ("(uint256,bytes)", true),
        ("(uint256,address)", false),
        ("(uint256,address)[2]", false),
        ("(uint256,(bool,string))", true),
        ("bytes32[3][2]", false),
        ("uint8[]", true),
        ("string[1]", true),
    ];
    for (text, dynamic) in cases {
        assert_eq!(parse_type(text).unwrap().is_dynamic(), dynamic, "{text}");
    }
}

#[test]
fn test_tuple_array_offsets() {
    let ty = parse_type("(uint256,string)[]").unwrap();
    let value = tokenize(&ty, r#"[(1,"a"),(2,"bc")]"#).unwrap();

    let encoded = encode(std::slice::from_ref(&ty), std::slice::from_ref(&value)).unwrap();
    let expected = [
        word(0x20),       // offset of the array
        word(2),          // length
        word(0x40),       // element 0, relative to the element block
        word(0xc0),       // element 1
        word(1),          // element 0: uint256
        word(0x40),       // element 0: string offset inside the tuple
        word(1),          // "a" length
        text_word("a"),
        word(2),          // element 1: uint256
        word(0x40),
        word(2),          // "bc" length
        text_word("bc"),
    ]
    .concat();
    assert_eq!(hex::encode(&encoded), expected);

    let decoded = decode(&[ty], &encoded, &DecodeOptions::default()).unwrap();
    assert_eq!(decoded, vec![value]);
}

#[test]
fn test_overflow_rejected() {
    assert_eq!(
        encode(&[ParamType::Uint(8)], &[Token::uint(256u64)]),
        Err(AbiError::Overflow("uint8".into()))
    );
    assert_eq!(
        encode(&[ParamType::Int(8)], &[Token::int(-129)]),
        Err(AbiError::Overflow("int8".into()))
    );
    assert!(encode(&[ParamType::Int(8)], &[Token::int(-128)]).is_ok());
    assert!(encode(&[ParamType::Uint(8)], &[Token::uint(255u64)]).is_ok());
}

#[test]
fn test_junk_data_switch() {
    let types = [ParamType::Uint(256)];
    let data = hex::decode([word(5), word(0)].concat()).unwrap();

    assert_eq!(
        decode(&types, &data, &DecodeOptions::default()),
        Err(AbiError::JunkDataNotAllowed {
            consumed: 32,
            total: 64
        })
    );
    assert_eq!(
        decode(&types, &data, &DecodeOptions::lenient()).unwrap(),
        vec![Token::uint(5u64)]
    );
}

#[test]
fn test_length_budget() {
    let types = [parse_type("uint8[]").unwrap()];
    let tokens = [Token::Array(vec![Token::uint(1u64); 10])];
    let data = encode(&types, &tokens).unwrap();

    let tight = DecodeOptions {
        max_length: 4,
        ..DecodeOptions::default()
    };
    assert!(matches!(
        decode(&types, &data, &tight),
        Err(AbiError::LengthMismatch { length: 10, .. })
    ));
    assert_eq!(decode(&types, &data, &DecodeOptions::default()).unwrap(), tokens);
}

// ==================== Front End Agreement Tests ====================

const VAULT_JSON: &str = r#"[
    {"type":"constructor","inputs":[{"name":"owner","type":"address"}],"stateMutability":"payable"},
    {"type":"function","name":"deposit","stateMutability":"payable",
     "inputs":[{"name":"order","type":"tuple","internalType":"struct Vault.Order","components":[
        {"name":"maker","type":"address"},
        {"name":"amounts","type":"uint256[]"}]}],
     "outputs":[{"name":"","type":"bool"}]},
    {"type":"function","name":"balanceOf","stateMutability":"view",
     "inputs":[{"name":"account","type":"address"}],
     "outputs":[{"name":"","type":"uint256"}]},
    {"type":"event","name":"Deposited","anonymous":false,"inputs":[
        {"name":"maker","type":"address","indexed":true},
        {"name":"total","type":"uint256","indexed":false}]},
    {"type":"error","name":"Insufficient","inputs":[{"name":"needed","type":"uint256"}]}
]"#;

const VAULT_HUMAN: &str = "
    struct Order { address maker; uint256[] amounts; }
    constructor(address owner) payable
    function deposit(Order order) payable returns (bool)
    function balanceOf(address account) view returns (uint256)
    event Deposited(address indexed maker, uint256 total)
    error Insufficient(uint256 needed)
";

#[test]
fn test_json_and_human_readable_agree() {
    let from_json = Abi::from_json(VAULT_JSON).unwrap();
    let from_text = parse_abi(VAULT_HUMAN).unwrap();

    assert_eq!(from_json.items().len(), from_text.items().len());
    for (a, b) in from_json.functions().zip(from_text.functions()) {
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.selector(), b.selector());
        assert_eq!(a.state_mutability, b.state_mutability);
    }
    assert_eq!(
        from_json.event("Deposited").unwrap().topic(),
        from_text.event("Deposited").unwrap().topic()
    );

    let order = tokenize(
        &from_text.function("deposit").unwrap().inputs[0].kind,
        "(0x0000000000000000000000000000000000000001,[1,2,3])",
    )
    .unwrap();
    assert_eq!(
        from_json.encode_write_call("deposit", &[order.clone()], U256::one()).unwrap(),
        from_text.encode_write_call("deposit", &[order], U256::one()).unwrap()
    );
}

#[test]
fn test_json_round_trip() {
    let abi = Abi::from_json(VAULT_JSON).unwrap();
    let json = abi.to_json().unwrap();
    assert_eq!(Abi::from_json(&json).unwrap(), abi);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let deposit = &value[1];
    assert_eq!(deposit["inputs"][0]["type"], "tuple");
    assert_eq!(deposit["inputs"][0]["internalType"], "struct Vault.Order");
    assert_eq!(deposit["inputs"][0]["components"][1]["type"], "uint256[]");
}

#[test]
fn test_display_parses_back_for_every_item() {
    let abi = parse_abi(VAULT_HUMAN).unwrap();
    for item in abi.items() {
        let rendered = item.to_string();
        let mut reparsed = parse_signature(&rendered).unwrap();
        // Struct names do not survive rendering
        if let (abikit::AbiItem::Function(original), abikit::AbiItem::Function(copy)) = (item, &mut reparsed) {
            for (a, b) in original.inputs.iter().zip(copy.inputs.iter_mut()) {
                b.internal_type = a.internal_type.clone();
            }
        }
        assert_eq!(&reparsed, item, "{rendered}");
    }
}

#[test]
fn test_lookup_and_gates() {
    let abi = Abi::from_json(VAULT_JSON).unwrap();

    assert!(abi.get_abi_item(AbiItemKind::Function, "balanceOf").is_ok());
    assert!(matches!(
        abi.get_abi_item(AbiItemKind::Function, "missing"),
        Err(AbiError::AbiItemNotFound { .. })
    ));

    let account = [Token::Address(Address::ZERO)];
    assert!(matches!(
        abi.encode_write_call("balanceOf", &account, U256::zero()),
        Err(AbiError::InvalidFunctionMutability { .. })
    ));
    assert!(abi.encode_read_call("balanceOf", &account).is_ok());

    // Payable constructor: value optional
    assert!(abi.encode_deploy(&[0x00], &account, U256::zero()).is_ok());
    assert!(abi.encode_deploy(&[0x00], &account, U256::from(5)).is_ok());

    let nonpayable = parse_abi("constructor(address owner)").unwrap();
    assert_eq!(
        nonpayable.encode_deploy(&[0x00], &account, U256::from(5)),
        Err(AbiError::ValueInNonPayableConstructor)
    );
}
