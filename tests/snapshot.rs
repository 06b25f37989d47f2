// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

/// Snapshot tests
///
/// These build a snapshot of the full fixture document, with the fixture agents in the catalog,
/// and then check what the different parts of the snapshot say about it.

#[cfg(test)]
mod tests {
    use crmconf_lib::snapshot::FailCount;
    use crmconf_lib::status::{Role, StatusReport};
    use crmconf_lib::test_env::{fixture_config, fixture_snapshot, read_fixture};
    use crmconf_lib::{Cluster, ClusterSnapshot};

    fn snapshot() -> ClusterSnapshot {
        fixture_snapshot("cib.xml", &fixture_config().version())
    }

    #[test]
    fn builds_without_warnings() {
        let snapshot = snapshot();
        assert!(snapshot.warnings().is_empty(), "{:?}", snapshot.warnings());
    }

    #[test]
    fn nodes() {
        let snapshot = snapshot();
        assert_eq!(snapshot.nodes(), ["node1", "node2"]);
        assert_eq!(snapshot.dc(), Some("node1"));
        assert!(snapshot.is_online("node1"));
        assert!(!snapshot.is_online("node2"));
        assert!(!snapshot.is_pending("node2"));
        assert_eq!(snapshot.node_parameter("node2", "standby"), Some("on"));
        assert_eq!(snapshot.property("stonith-enabled"), Some("false"));
        assert_eq!(snapshot.property_id("no-quorum-policy"), Some("opt-quorum"));
    }

    #[test]
    fn resource_tree() {
        let snapshot = snapshot();
        assert_eq!(
            snapshot.resources().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            ["ip", "cl-fs", "grp-fs", "fs1", "fs2", "A", "B", "C", "old"]
        );
        assert_eq!(snapshot.clone_to_resource("cl-fs"), Some("grp-fs"));
        assert_eq!(snapshot.groups_to_resources("grp-fs").unwrap(), ["fs1", "fs2"]);

        let ip = snapshot.resource("ip").unwrap();
        assert_eq!(ip.parameter("ip"), Some("10.0.0.5"));
        assert_eq!(ip.type_string(), "ocf:heartbeat:IPaddr2");
        assert!(snapshot.resource_agent("ip").unwrap().is_installed());
    }

    #[test]
    fn shared_blocks() {
        let snapshot = snapshot();
        let fs1 = snapshot.resource("fs1").unwrap();
        assert_eq!(fs1.parameter("target-role"), Some("Started"));
        assert_eq!(fs1.operation("monitor").unwrap().get("interval"), Some("10s"));
        assert_eq!(snapshot.meta_attrs_ref("fs1"), Some("ip"));
        assert_eq!(snapshot.operations_ref("fs1"), Some("ip"));
        assert_eq!(snapshot.meta_attrs_ref("fs2"), None);
    }

    #[test]
    fn defaults_apply_in_order() {
        let snapshot = snapshot();
        assert_eq!(snapshot.effective_meta("fs2", "resource-stickiness"), Some("100"));
        // ip has a monitor op without a timeout, op_defaults come before the agent's 20s
        assert_eq!(snapshot.effective_op_default("ip", "monitor", "timeout"), Some("60s"));
        assert_eq!(snapshot.effective_op_default("ip", "monitor", "interval"), Some("10s"));
    }

    #[test]
    fn constraints() {
        let snapshot = snapshot();
        assert_eq!(snapshot.colocations().len(), 1);
        assert_eq!(snapshot.colocations()[0].rsc, "ip");
        assert_eq!(snapshot.colocations()[0].with_rsc, "cl-fs");
        assert_eq!(snapshot.host_score("ip", "node1"), Some("100"));
        assert_eq!(snapshot.host_score("ip", "node2"), None);

        let set = snapshot.set_constraint("ord-abc").unwrap();
        assert!(!set.is_colocation);
        assert_eq!(set.connections.len(), 2);
        assert_eq!(set.connections[0].set1().members(), ["A"]);
        assert_eq!(set.connections[1].set2().unwrap().members(), ["C"]);
        assert_eq!(snapshot.placeholders().len(), 2);
    }

    #[test]
    fn status_section() {
        let snapshot = snapshot();
        assert_eq!(snapshot.failed("node1", "fs1:1"), Some(FailCount::Count(3)));
        assert_eq!(snapshot.failed("node1", "fs1"), Some(FailCount::Count(3)));
        assert_eq!(snapshot.failed("node1", "ip"), Some(FailCount::Infinity));
        assert_eq!(snapshot.failed("node2", "ip"), None);
        assert!(snapshot.failed_clones("node1", "fs1").unwrap().contains("1"));

        assert!(snapshot.is_orphan("old"));
        assert!(!snapshot.is_orphan("ip"));
        assert!(snapshot.resource("old").unwrap().orphaned);
    }

    #[test]
    fn edits_leave_the_snapshot_alone() {
        let snapshot = snapshot();
        let edited = snapshot.with_set_member_added("ord-abc", 0, "D");
        assert_eq!(edited.set_constraint("ord-abc").unwrap().connections.len(), 3);
        assert_eq!(snapshot.set_constraint("ord-abc").unwrap().connections.len(), 2);
    }

    #[test]
    fn crm_mon_report() {
        let report = StatusReport::parse(&read_fixture("crm_mon.xml")).unwrap();
        assert_eq!(report.running_on("ip"), ["node1"]);
        assert!(report.is_running("fs1"));
        assert_eq!(report.resource("cl-fs").unwrap().role, Role::Started);
        assert!(!report.is_managed("A"));
        assert!(!report.is_running("B"));
        assert!(report.is_managed("not-in-report"));
    }

    #[test]
    fn cluster_from_config() {
        let config = crmconf_lib::test_env::test_path("fixtures/crmconf.conf");
        let cluster = Cluster::from_config(config).unwrap();
        assert!(cluster.resource_status().is_some());
        assert!(cluster.catalog().contains("Dummy", Some("heartbeat"), "ocf"));

        let before = cluster.snapshot();
        let after = cluster.refresh().unwrap();
        assert_eq!(before.nodes(), after.nodes());
        assert!(cluster.version().pacemaker().is_some());
        assert!(!cluster.version().has_attributes_wrapper());
    }
}
