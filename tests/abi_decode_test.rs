use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, I256, U256};
use alloy_sol_types::{sol, SolCall};
use proptest::prelude::*;

use mintcheck::config::Config;
use mintcheck::domain::abi::{AbiDecoder, ContractInterface, Descriptor, Param};
use mintcheck::infrastructure::abi::{InterfaceDecoder, InterfaceIndexer};

sol! {
    function mintNFT(address recipient, string tokenURI);
    function safeTransferFrom(address from, address to, uint256 tokenId, bytes data);
}

fn bundled() -> InterfaceDecoder {
    InterfaceDecoder::new(&Config::default().contract_interface().unwrap()).unwrap()
}

#[test]
fn test_bundled_interface_decodes_mint() {
    let recipient = Address::repeat_byte(0x42);
    let calldata = mintNFTCall {
        recipient,
        tokenURI: "ipfs://bafybeigdyrzt".to_string(),
    }
    .abi_encode();

    let decoded = bundled().decode_function(&calldata).unwrap();
    assert_eq!(decoded.signature, "mintNFT(address,string)");
    assert_eq!(decoded.argument("recipient").unwrap().value, DynSolValue::Address(recipient));
    assert_eq!(
        decoded.argument("tokenURI").unwrap().value,
        DynSolValue::String("ipfs://bafybeigdyrzt".into())
    );
}

#[test]
fn test_bundled_interface_selectors_match_solidity() {
    let decoder = bundled();
    let index = decoder.index();
    assert!(index.lookup(mintNFTCall::SELECTOR).is_some());
    assert!(index.lookup(safeTransferFromCall::SELECTOR).is_some());
    assert_eq!(
        InterfaceIndexer::compute_selector("mintNFT(address,string)"),
        mintNFTCall::SELECTOR
    );
    assert_eq!(index.constructor().unwrap().inputs.len(), 2);
}

#[test]
fn test_tuple_arguments_decode_in_order() {
    sol! {
        struct Order { uint256 amount; address maker; }
        function settle(Order[] orders, bool strict);
    }

    let interface = ContractInterface::from_json(
        r#"[{
            "type": "function",
            "name": "settle",
            "inputs": [
                {"name": "orders", "type": "tuple[]", "components": [
                    {"name": "amount", "type": "uint256"},
                    {"name": "maker", "type": "address"}
                ]},
                {"name": "strict", "type": "bool"}
            ]
        }]"#,
    )
    .unwrap();
    let decoder = InterfaceDecoder::new(&interface).unwrap();

    let calldata = settleCall {
        orders: vec![
            Order {
                amount: U256::from(5),
                maker: Address::repeat_byte(1),
            },
            Order {
                amount: U256::from(9),
                maker: Address::repeat_byte(2),
            },
        ],
        strict: true,
    }
    .abi_encode();

    let decoded = decoder.decode_function(&calldata).unwrap();
    assert_eq!(decoded.signature, "settle((uint256,address)[],bool)");
    assert_eq!(decoded.arguments[0].kind, "(uint256,address)[]");
    assert_eq!(
        decoded.arguments[0].value,
        DynSolValue::Array(vec![
            DynSolValue::Tuple(vec![
                DynSolValue::Uint(U256::from(5), 256),
                DynSolValue::Address(Address::repeat_byte(1)),
            ]),
            DynSolValue::Tuple(vec![
                DynSolValue::Uint(U256::from(9), 256),
                DynSolValue::Address(Address::repeat_byte(2)),
            ]),
        ])
    );
    assert_eq!(decoded.arguments[1].value, DynSolValue::Bool(true));
}

fn deployment_decoder() -> InterfaceDecoder {
    InterfaceDecoder::new(&ContractInterface::new(vec![Descriptor::constructor(vec![
        Param::new("cap", "uint256"),
        Param::new("offset", "int32"),
        Param::new("paused", "bool"),
        Param::new("admin", "address"),
        Param::new("label", "string"),
    ])]))
    .unwrap()
}

proptest! {
    #[test]
    fn prop_constructor_arguments_recovered_without_bytecode(
        bytecode in proptest::collection::vec(any::<u8>(), 0..200),
        cap in any::<u64>(),
        offset in any::<i32>(),
        paused in any::<bool>(),
        admin in any::<[u8; 20]>(),
        label in "[a-zA-Z0-9 ]{1,32}",
    ) {
        let args = vec![
            DynSolValue::Uint(U256::from(cap), 256),
            DynSolValue::Int(I256::try_from(offset).unwrap(), 32),
            DynSolValue::Bool(paused),
            DynSolValue::Address(Address::from(admin)),
            DynSolValue::String(label),
        ];
        let mut calldata = bytecode;
        calldata.extend_from_slice(&DynSolValue::Tuple(args.clone()).abi_encode_params());

        let decoded = deployment_decoder().decode_constructor(&calldata, None).unwrap();
        let values: Vec<DynSolValue> = decoded.arguments.into_iter().map(|arg| arg.value).collect();
        prop_assert_eq!(values, args);
    }
}
