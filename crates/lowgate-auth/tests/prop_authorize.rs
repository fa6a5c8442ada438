//! Property tests for the pure permission model.

use lowgate_auth::{Decision, OpPattern, PermissionModel};
use lowgate_types::{ClientKind, LowStateCommand};
use proptest::prelude::*;

fn client_kind() -> impl Strategy<Value = ClientKind> {
    prop_oneof![
        Just(ClientKind::Local),
        Just(ClientKind::LocalAsync),
        Just(ClientKind::Runner),
        Just(ClientKind::RunnerAsync),
        Just(ClientKind::Wheel),
        Just(ClientKind::WheelAsync),
    ]
}

fn function_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}\\.[a-z]{1,8}"
}

fn command() -> impl Strategy<Value = LowStateCommand> {
    (client_kind(), function_name(), "[a-z0-9*-]{1,12}").prop_map(|(client, function, target)| {
        let cmd = LowStateCommand::new(client, function);
        if client.uses_target() {
            cmd.with_target(target)
        } else {
            cmd
        }
    })
}

fn grant() -> impl Strategy<Value = OpPattern> {
    (client_kind(), function_name()).prop_map(|(client, function)| OpPattern::new(client, function))
}

proptest! {
    /// The empty grant set denies every command.
    #[test]
    fn prop_empty_grants_deny(cmd in command()) {
        let model = PermissionModel;
        prop_assert_eq!(model.authorize(&[], &cmd), Decision::Deny);
    }

    /// Allow requires at least one individually-matching grant: the
    /// decision over a set equals the disjunction of per-grant matches.
    #[test]
    fn prop_allow_iff_some_grant_matches(grants in prop::collection::vec(grant(), 0..6), cmd in command()) {
        let model = PermissionModel;
        let expected = grants.iter().any(|g| g.matches(&cmd));
        prop_assert_eq!(model.authorize(&grants, &cmd).is_allow(), expected);
    }

    /// Identical inputs always yield identical decisions, regardless of
    /// how many times or in what order the model is consulted.
    #[test]
    fn prop_decisions_are_pure(grants in prop::collection::vec(grant(), 0..6), cmds in prop::collection::vec(command(), 1..8)) {
        let model = PermissionModel;
        let first: Vec<Decision> = cmds.iter().map(|c| model.authorize(&grants, c)).collect();
        // Re-evaluate in reverse order; prior calls must not matter.
        let second: Vec<Decision> = cmds.iter().rev().map(|c| model.authorize(&grants, c)).collect();
        let second: Vec<Decision> = second.into_iter().rev().collect();
        prop_assert_eq!(first, second);
    }

    /// Reordering the grant set never changes the decision.
    #[test]
    fn prop_grant_order_irrelevant(grants in prop::collection::vec(grant(), 0..6), cmd in command()) {
        let model = PermissionModel;
        let forward = model.authorize(&grants, &cmd);
        let reversed: Vec<OpPattern> = grants.iter().rev().cloned().collect();
        prop_assert_eq!(model.authorize(&reversed, &cmd), forward);
    }

    /// Adding a grant never turns an Allow into a Deny.
    #[test]
    fn prop_grants_are_monotone(grants in prop::collection::vec(grant(), 0..6), extra in grant(), cmd in command()) {
        let model = PermissionModel;
        if model.authorize(&grants, &cmd).is_allow() {
            let mut widened = grants.clone();
            widened.push(extra);
            prop_assert!(model.authorize(&widened, &cmd).is_allow());
        }
    }

    /// A grant authorizes the async flavor of a client exactly when it
    /// authorizes the synchronous family.
    #[test]
    fn prop_async_flavor_equivalent(g in grant(), function in function_name(), target in "[a-z0-9*-]{1,12}") {
        let model = PermissionModel;
        let grants = vec![g];

        let sync_cmd = LowStateCommand::new(ClientKind::Local, function.clone()).with_target(target.clone());
        let async_cmd = LowStateCommand::new(ClientKind::LocalAsync, function).with_target(target);

        prop_assert_eq!(
            model.authorize(&grants, &sync_cmd),
            model.authorize(&grants, &async_cmd)
        );
    }
}
