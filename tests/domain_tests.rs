use role_hierarchy_service::domain::{
    consistency::{PermissionCatalog, validate},
    hierarchy::{ancestors_of, descendants_of, siblings_under_shared_ancestors},
    permission::{Permission, PermissionKey},
    resolution::{EffectivePermissions, Provenance, ResolutionPolicy, resolve},
    role_graph::{RoleGraph, RoleNode},
};
use role_hierarchy_service::test_utils::{
    ADMIN, EDITOR, GUEST, USER, seed_permissions, seed_roles,
};

fn key(action: &str, resource: &str) -> PermissionKey {
    PermissionKey::new(action, resource)
}

fn seed_graph() -> RoleGraph {
    RoleGraph::from_catalog(&seed_roles(), &seed_permissions())
}

fn effective(graph: &RoleGraph, role_id: &str, policy: ResolutionPolicy) -> EffectivePermissions {
    EffectivePermissions::from_resolved(resolve(graph, role_id, policy), graph)
}

// ===== PERMISSION KEY TESTS =====

#[test]
fn test_permission_key_identity_ignores_storage_id() {
    let a = Permission::new("p1".to_string(), "read".to_string(), "post".to_string());
    let b = Permission::new("p2".to_string(), "read".to_string(), "post".to_string())
        .with_name("Read posts".to_string());

    assert_eq!(a.key(), b.key());
    assert_eq!(a.key().to_string(), "read:post");
}

#[test]
fn test_permission_key_parsing() {
    let parsed: PermissionKey = "manage:users".parse().unwrap();
    assert_eq!(parsed, key("manage", "users"));

    assert!("manage".parse::<PermissionKey>().is_err());
    assert!(":users".parse::<PermissionKey>().is_err());
    assert!("manage:".parse::<PermissionKey>().is_err());
}

// ===== HIERARCHY NAVIGATION TESTS =====

#[test]
fn test_seed_hierarchy_navigation() {
    let graph = seed_graph();

    assert_eq!(ancestors_of(&graph, ADMIN), vec![EDITOR, USER, GUEST]);
    assert_eq!(descendants_of(&graph, GUEST), vec![USER, EDITOR, ADMIN]);
    assert!(ancestors_of(&graph, GUEST).is_empty());
    assert!(descendants_of(&graph, ADMIN).is_empty());
    // A single chain has no siblings, but ancestors show up as children of their parents.
    assert_eq!(siblings_under_shared_ancestors(&graph, ADMIN), vec![EDITOR, USER]);
}

#[test]
fn test_two_role_cycle_terminates() {
    let graph = RoleGraph::from_nodes(vec![
        RoleNode::new("x", "X")
            .with_parent("y")
            .with_permission(key("read", "x")),
        RoleNode::new("y", "Y")
            .with_parent("x")
            .with_permission(key("read", "y")),
    ]);

    assert_eq!(ancestors_of(&graph, "x"), vec!["y"]);
    assert_eq!(descendants_of(&graph, "x"), vec!["y"]);

    for policy in [ResolutionPolicy::StrictAncestor, ResolutionPolicy::BroadHierarchy] {
        let result = effective(&graph, "x", policy);
        assert_eq!(result.direct, vec![key("read", "x")]);
        assert_eq!(result.inherited.len(), 1);
        assert_eq!(result.inherited[0].source_role_id, "y");
    }
}

// ===== RESOLUTION TESTS =====

#[test]
fn test_strict_admin_scenario() {
    let graph = seed_graph();

    let admin = effective(&graph, ADMIN, ResolutionPolicy::StrictAncestor);

    assert_eq!(admin.role_name.as_deref(), Some("admin"));
    assert_eq!(admin.direct, vec![key("delete", "post"), key("manage", "users")]);
    let inherited: Vec<(String, &str)> = admin
        .inherited
        .iter()
        .map(|i| (i.key.to_string(), i.source_role_name.as_str()))
        .collect();
    assert_eq!(
        inherited,
        vec![
            ("read:post".to_string(), "guest"),
            ("write:post".to_string(), "user"),
        ]
    );
}

#[test]
fn test_strict_guest_has_only_direct_permissions() {
    let graph = seed_graph();

    let guest = effective(&graph, GUEST, ResolutionPolicy::StrictAncestor);

    assert_eq!(guest.direct, vec![key("read", "post")]);
    assert!(guest.inherited.is_empty());
}

#[test]
fn test_broad_guest_inherits_from_descendants() {
    let graph = seed_graph();

    let guest = effective(&graph, GUEST, ResolutionPolicy::BroadHierarchy);

    assert_eq!(guest.direct, vec![key("read", "post")]);
    let sources: Vec<(String, &str)> = guest
        .inherited
        .iter()
        .map(|i| (i.key.to_string(), i.source_role_id.as_str()))
        .collect();
    assert_eq!(
        sources,
        vec![
            ("delete:post".to_string(), ADMIN),
            ("manage:users".to_string(), ADMIN),
            ("write:post".to_string(), USER),
        ]
    );
}

#[test]
fn test_nearest_ancestor_wins_provenance() {
    let graph = RoleGraph::from_nodes(vec![
        RoleNode::new("a", "A").with_permission(key("read", "post")),
        RoleNode::new("b", "B")
            .with_parent("a")
            .with_permission(key("read", "post")),
        RoleNode::new("c", "C").with_parent("b"),
    ]);

    let resolved = resolve(&graph, "c", ResolutionPolicy::StrictAncestor);

    assert_eq!(
        resolved.get(&key("read", "post")).map(|e| &e.provenance),
        Some(&Provenance::InheritedFrom("b".to_string()))
    );
}

#[test]
fn test_resolution_is_idempotent() {
    let graph = seed_graph();

    for policy in [ResolutionPolicy::StrictAncestor, ResolutionPolicy::BroadHierarchy] {
        for role in [GUEST, USER, EDITOR, ADMIN] {
            assert_eq!(effective(&graph, role, policy), effective(&graph, role, policy));
        }
    }
}

#[test]
fn test_unknown_role_resolves_to_nothing() {
    let graph = seed_graph();

    let result = effective(&graph, "ghost", ResolutionPolicy::BroadHierarchy);

    assert!(result.is_empty());
    assert!(result.role_name.is_none());
}

// ===== CONSISTENCY VALIDATOR TESTS =====

#[test]
fn test_validator_drops_keys_missing_from_catalog() {
    let graph = seed_graph();
    let catalog: PermissionCatalog = [key("read", "post"), key("delete", "post")]
        .into_iter()
        .collect();

    let validated = validate(resolve(&graph, ADMIN, ResolutionPolicy::StrictAncestor), &catalog);

    let mut keys: Vec<String> = validated.keys().map(|k| k.to_string()).collect();
    keys.sort();
    assert_eq!(keys, vec!["delete:post", "read:post"]);
    assert!(validated.keys().all(|k| catalog.contains(k)));
}
