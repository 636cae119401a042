//! Property-based tests: random requests must survive build -> parse unchanged, and the
//! codec must stay canonical.

mod rlp_properties {
    use evm_rawtx::core::rlp::{self, RlpItem};
    use ethers::types::U256;
    use proptest::prelude::*;

    fn rlp_item() -> impl Strategy<Value = RlpItem> {
        let leaf = prop::collection::vec(any::<u8>(), 0..80).prop_map(RlpItem::Bytes);
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop::collection::vec(inner, 0..6).prop_map(RlpItem::List)
        })
    }

    proptest! {
        #[test]
        fn property_encoding_is_reversible(item in rlp_item()) {
            let encoded = rlp::encode(&item);
            prop_assert_eq!(rlp::decode(&encoded).unwrap(), item);
        }

        #[test]
        fn property_integers_are_minimal(value in any::<u64>()) {
            let bytes = rlp::u64_to_minimal_be(value);
            prop_assert!(bytes.first() != Some(&0));
            prop_assert_eq!(rlp::minimal_be_to_u64(&bytes).unwrap(), value);
            prop_assert_eq!(rlp::u256_to_minimal_be(U256::from(value)), bytes);
        }

        #[test]
        fn property_u256_integers_are_minimal(raw in any::<[u8; 32]>()) {
            let value = U256::from_big_endian(&raw);
            let bytes = rlp::u256_to_minimal_be(value);
            prop_assert!(bytes.len() <= 32);
            prop_assert!(bytes.first() != Some(&0));
            prop_assert_eq!(bytes.as_slice(), rlp::strip_leading_zeros(&raw));
            prop_assert_eq!(rlp::minimal_be_to_u256(&bytes).unwrap(), value);
            prop_assert_eq!(RlpItem::u256(value).as_u256().unwrap(), value);
        }

        #[test]
        fn property_decode_never_panics(input in prop::collection::vec(any::<u8>(), 0..128)) {
            let _ = rlp::decode(&input);
        }
    }
}

mod transaction_properties {
    use ethers::types::{Address, H256, U256};
    use evm_rawtx::{
        parse_signed_transaction, AccessListItem, TransactionBuilder, TransactionRequest,
        TransactionType, TxSigningKey,
    };
    use proptest::prelude::*;

    fn tx_type() -> impl Strategy<Value = TransactionType> {
        prop_oneof![
            Just(TransactionType::Legacy),
            Just(TransactionType::Eip2930),
            Just(TransactionType::Eip1559),
        ]
    }

    fn access_list() -> impl Strategy<Value = Vec<AccessListItem>> {
        prop::collection::vec(
            (any::<[u8; 20]>(), prop::collection::vec(any::<[u8; 32]>(), 0..3)).prop_map(
                |(address, keys)| {
                    AccessListItem::new(
                        Address::from(address),
                        keys.into_iter().map(H256::from).collect(),
                    )
                },
            ),
            0..3,
        )
    }

    prop_compose! {
        fn request()(
            tx_type in tx_type(),
            chain_id in 1u64..1_000_000,
            nonce in any::<u64>(),
            fee in any::<u64>(),
            tip in any::<u64>(),
            gas_limit in 21_000u64..30_000_000,
            to in prop::option::of(any::<[u8; 20]>()),
            value in any::<[u8; 32]>(),
            data in prop::collection::vec(any::<u8>(), 0..200),
            access_list in access_list(),
        ) -> TransactionRequest {
            let mut request = TransactionRequest::new(tx_type, chain_id)
                .nonce(nonce)
                .gas_limit(gas_limit)
                .value(U256::from_big_endian(&value))
                .data(data);
            request.to = to.map(Address::from);
            match tx_type {
                TransactionType::Eip1559 => {
                    request = request.max_fee_per_gas(fee).max_priority_fee_per_gas(tip);
                }
                _ => request = request.gas_price(fee),
            }
            if tx_type != TransactionType::Legacy {
                request = request.access_list(access_list);
            }
            request
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn property_build_parse_round_trip(request in request(), seed in 1u8..0x80) {
            let key = TxSigningKey::new([seed; 32]);
            let builder = TransactionBuilder::default();
            let signed = builder.build(&request, &key).unwrap();
            let parsed = parse_signed_transaction(&signed.raw).unwrap();

            let mut expected = builder.resolve(&request).unwrap();
            expected.from = Some(key.address().unwrap());
            prop_assert_eq!(parsed.to_request().unwrap(), expected);
            prop_assert_eq!(parsed.hash, signed.hash);
            prop_assert_eq!(parsed.signing_hash, signed.signing_hash);
        }

        #[test]
        fn property_build_is_deterministic(request in request()) {
            let key = TxSigningKey::new([0x42; 32]);
            let builder = TransactionBuilder::default();
            let a = builder.build(&request, &key).unwrap();
            let b = builder.build(&request, &key).unwrap();
            prop_assert_eq!(a.raw, b.raw);
            prop_assert_eq!(a.hash, b.hash);
        }
    }
}
