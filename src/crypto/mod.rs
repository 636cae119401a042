pub mod signature_utils;

pub use self::signature_utils::{keccak256, recover_address, sign_hash, RawSignature};
