pub const CHECKSUM_SIZE: usize = 16;
pub const CHECKSUM_HEX_SIZE: usize = CHECKSUM_SIZE * 2;
pub const MAX_TRANSACTIONS_PER_BLOCK: usize = 10;
pub const MIN_ACCOUNT_LEN: usize = 2;
pub const MAX_ACCOUNT_LEN: usize = 10;
pub const MAX_QUERY_ACCOUNT_LEN: usize = 100;
