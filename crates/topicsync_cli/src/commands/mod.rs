pub(crate) mod migrate;
pub(crate) mod serve;
pub(crate) mod shared;
pub(crate) mod sync;
