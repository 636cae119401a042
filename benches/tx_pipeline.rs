//! Build/parse throughput for each supported transaction type.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ethers::types::{Address, H256};
use evm_rawtx::core::rlp;
use evm_rawtx::{
    parse_signed_transaction, AccessListItem, TransactionBuilder, TransactionRequest, TransactionType,
    TxSigningKey,
};

fn request(tx_type: TransactionType) -> TransactionRequest {
    let request = TransactionRequest::new(tx_type, 20200)
        .nonce(12)
        .gas_limit(220000)
        .to(Address::repeat_byte(0x11))
        .value(1_000_000_000_000_000u64)
        .data(vec![0xab; 68]);
    match tx_type {
        TransactionType::Legacy => request,
        _ => request.access_list(vec![AccessListItem::new(
            Address::repeat_byte(0x22),
            vec![H256::repeat_byte(0x01), H256::repeat_byte(0x02)],
        )]),
    }
}

fn bench_build(c: &mut Criterion) {
    let key = TxSigningKey::new([0x01u8; 32]);
    let builder = TransactionBuilder::default();
    for tx_type in [TransactionType::Legacy, TransactionType::Eip2930, TransactionType::Eip1559] {
        let request = request(tx_type);
        c.bench_function(&format!("build_{}", tx_type), |b| {
            b.iter(|| builder.build(black_box(&request), &key).expect("build failed"));
        });
    }
}

fn bench_parse(c: &mut Criterion) {
    let key = TxSigningKey::new([0x01u8; 32]);
    let signed = TransactionBuilder::default()
        .build(&request(TransactionType::Eip1559), &key)
        .expect("build failed");

    c.bench_function("parse_EIP1559", |b| {
        b.iter(|| parse_signed_transaction(black_box(&signed.raw)).expect("parse failed"));
    });
    c.bench_function("parse_and_recover_EIP1559", |b| {
        b.iter(|| {
            parse_signed_transaction(black_box(&signed.raw))
                .and_then(|parsed| parsed.recover_sender())
                .expect("recover failed")
        });
    });
}

fn bench_rlp_decode(c: &mut Criterion) {
    let key = TxSigningKey::new([0x01u8; 32]);
    let signed = TransactionBuilder::default()
        .build(&request(TransactionType::Eip2930), &key)
        .expect("build failed");
    let body = &signed.raw[1..];

    c.bench_function("rlp_decode_EIP2930", |b| {
        b.iter(|| rlp::decode(black_box(body)).expect("decode failed"));
    });
}

criterion_group!(benches, bench_build, bench_parse, bench_rlp_decode);
criterion_main!(benches);
