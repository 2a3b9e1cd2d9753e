pub(crate) mod data;
pub(crate) mod runtime;
pub(crate) mod util;
