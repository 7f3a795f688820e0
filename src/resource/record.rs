//! Records and execution context

/// The (profile, region) pair a walk is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionContext {
    pub profile: String,
    pub region: String,
}

impl ExecutionContext {
    pub fn new(profile: &str, region: &str) -> Self {
        Self {
            profile: profile.to_string(),
            region: region.to_string(),
        }
    }
}

/// One output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub profile: String,
    pub region: String,
    pub type_id: String,
    pub name: String,
}

impl ResourceRecord {
    pub fn new(ctx: &ExecutionContext, type_id: &str, name: String) -> Self {
        Self {
            profile: ctx.profile.clone(),
            region: ctx.region.clone(),
            type_id: type_id.to_string(),
            name,
        }
    }
}
