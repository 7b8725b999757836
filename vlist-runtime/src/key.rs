/// Bound required of item keys throughout this crate. `vlist`'s own `KeyCacheKey` is
/// `std`-or-`no_std` dual-mode; this crate is `std`-only, so it settles on the hashable bound.
pub trait ViewportKey: core::hash::Hash + Eq {}
impl<T: core::hash::Hash + Eq> ViewportKey for T {}
