pub trait PartialClone {
    /// Create a partial clone of `self`, which clones all emulation state but may not clone
    /// read-only fields such as ROMs and other host-owned resources.
    #[must_use]
    fn partial_clone(&self) -> Self;
}

pub use jgenesis_proc_macros::PartialClone;
