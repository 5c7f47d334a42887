// ============================================================================
// Domain Layer
// ============================================================================
//
// Business rules for orders, kept apart from transport and storage.
// Remote collaborators and the store are reached only through traits
// injected at construction time.
//
// ============================================================================

pub mod order;
