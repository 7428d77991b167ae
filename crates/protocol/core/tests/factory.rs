use std::sync::Arc;

use async_trait::async_trait;
use protocol_core::{
    Direction, FieldResolver, FieldSet, Lookup, LookupKind, Packet, PacketError, PacketFactory,
    PacketRegistry, ReactionCollectorReactPacket, RoutingContext,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct GreetingPacket {
    greeted: String,
    guild: String,
    level: u32,
}

impl Packet for GreetingPacket {
    const NAME: &'static str = "GreetingPacket";
    const DIRECTION: Direction = Direction::ServerToClient;
}

struct StaticResolver;

#[async_trait]
impl FieldResolver for StaticResolver {
    async fn resolve(&self, lookup: &Lookup, context: &RoutingContext) -> anyhow::Result<Value> {
        match lookup.kind {
            LookupKind::DisplayName => Ok(json!(format!("{}@{}", lookup.key, context.language))),
            LookupKind::GroupName => anyhow::bail!("group service unavailable"),
        }
    }
}

fn factory() -> PacketFactory {
    let mut registry = PacketRegistry::with_core_packets();
    registry.register::<GreetingPacket>().unwrap();
    PacketFactory::new(Arc::new(registry))
}

fn ctx() -> RoutingContext {
    RoutingContext::new("u-1", "discord", "node-a").with_language("fr")
}

#[tokio::test]
async fn deferred_fields_are_resolved_before_validation() {
    let factory = factory().with_resolver(Arc::new(StaticResolver));
    let fields = FieldSet::new()
        .deferred("greeted", Lookup::display_name("u-2"))
        .with("guild", "Night Owls")
        .with("level", 7);

    let packet = factory
        .create(GreetingPacket::NAME, &ctx(), fields)
        .await
        .unwrap();

    assert_eq!(packet.direction(), Direction::ServerToClient);
    assert_eq!(
        packet.decode::<GreetingPacket>().unwrap(),
        GreetingPacket {
            greeted: "u-2@fr".into(),
            guild: "Night Owls".into(),
            level: 7,
        }
    );
}

#[tokio::test]
async fn missing_required_field_is_reported_by_name() {
    let fields = FieldSet::new().with("greeted", "x").with("level", 1);

    let err = factory()
        .create(GreetingPacket::NAME, &ctx(), fields)
        .await
        .unwrap_err();

    match err {
        PacketError::MissingField { packet, field } => {
            assert_eq!(packet, GreetingPacket::NAME);
            assert_eq!(field, "guild");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_packet_names_are_rejected() {
    let err = factory()
        .create("NoSuchPacket", &ctx(), FieldSet::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PacketError::UnknownPacket(name) if name == "NoSuchPacket"));
}

#[tokio::test]
async fn deferred_field_without_resolver_fails() {
    let fields = FieldSet::new()
        .deferred("greeted", Lookup::display_name("u-2"))
        .with("guild", "g")
        .with("level", 1);

    let err = factory()
        .create(GreetingPacket::NAME, &ctx(), fields)
        .await
        .unwrap_err();
    assert!(matches!(err, PacketError::UnresolvedField { field, .. } if field == "greeted"));
}

#[tokio::test]
async fn resolver_failures_name_the_field() {
    let factory = factory().with_resolver(Arc::new(StaticResolver));
    let fields = FieldSet::new()
        .with("greeted", "x")
        .deferred("guild", Lookup::new(LookupKind::GroupName, "u-1"))
        .with("level", 1);

    let err = factory
        .create(GreetingPacket::NAME, &ctx(), fields)
        .await
        .unwrap_err();
    assert!(matches!(err, PacketError::Resolve { field, .. } if field == "guild"));
}

#[test]
fn ready_field_sets_build_synchronously() {
    let fields = FieldSet::new()
        .with("id", "c-1")
        .with("reactor_id", "u-1")
        .with("reaction_index", 0);

    let packet = factory()
        .create_ready(ReactionCollectorReactPacket::NAME, fields)
        .unwrap();

    assert_eq!(packet.direction(), Direction::ClientToServer);
    assert_eq!(packet.decode::<ReactionCollectorReactPacket>().unwrap().reaction_index, 0);
}
