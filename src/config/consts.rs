/// Highest-priority layer; settable at runtime, never persisted.
pub const RUNTIME_LAYER: &str = "runtime";
/// Account settings; loaded from and saved back to the account document.
pub const ACCOUNT_LAYER: &str = "account";
/// Shipped defaults; read-only at runtime.
pub const DEFAULTS_LAYER: &str = "defaults";
