//! Deferred field lookups backed by the routing context.
use anyhow::bail;
use async_trait::async_trait;
use serde_json::Value;

use protocol_core::{FieldResolver, Lookup, LookupKind, RoutingContext};

/// Platform handle a front-end may attach with the subject's display name.
pub const DISPLAY_NAME_HANDLE: &str = "display_name";

/// Resolves display names from platform handles.
///
/// A lookup for the context's own subject uses the `display_name` handle;
/// any other subject falls back to its raw id. Group names are not known to
/// this node.
#[derive(Debug, Default)]
pub struct HandleResolver;

#[async_trait]
impl FieldResolver for HandleResolver {
    async fn resolve(&self, lookup: &Lookup, context: &RoutingContext) -> anyhow::Result<Value> {
        match lookup.kind {
            LookupKind::DisplayName => {
                let name = context
                    .handles
                    .get(DISPLAY_NAME_HANDLE)
                    .filter(|_| context.subject.as_str() == lookup.key)
                    .unwrap_or(&lookup.key);
                Ok(Value::String(name.to_owned()))
            }
            LookupKind::GroupName => bail!("no group directory for {}", lookup.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn own_display_name_comes_from_handles() {
        let context = RoutingContext::new("u-1", "bot", "node-0").with_handle(DISPLAY_NAME_HANDLE, "Aria");

        let own = HandleResolver
            .resolve(&Lookup::display_name("u-1"), &context)
            .await
            .unwrap();
        let other = HandleResolver
            .resolve(&Lookup::display_name("u-2"), &context)
            .await
            .unwrap();

        assert_eq!(own, Value::String("Aria".into()));
        assert_eq!(other, Value::String("u-2".into()));
    }

    #[tokio::test]
    async fn group_names_are_unknown() {
        let context = RoutingContext::new("u-1", "bot", "node-0");
        let lookup = Lookup::new(LookupKind::GroupName, "u-1");
        assert!(HandleResolver.resolve(&lookup, &context).await.is_err());
    }
}
