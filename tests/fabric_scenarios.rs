#[cfg(test)]
mod fabric_scenarios {
    use std::collections::{BTreeSet, HashMap};

    use openflow_fabric::controller::{
        Controller, ControllerId, LearningController, PathPolicy, PathRequest, SessionRegistry,
    };
    use openflow_fabric::installer::SwitchInstaller;
    use openflow_fabric::net::{Fabric, MacAddress, NetDeviceId, NodeId, SwitchDeviceId};
    use openflow_fabric::topology::{FabricPlan, PortList, PortMap, PortRef};

    /// Controller that records, at each `compute_path`, which switch
    /// neighbors were already registered.
    struct RecordingController {
        id: ControllerId,
        registry: SessionRegistry,
        requests: Vec<PathRequest>,
        resolved_at_call: HashMap<MacAddress, Vec<bool>>,
    }

    impl RecordingController {
        fn new() -> Self {
            Self {
                id: ControllerId::next(),
                registry: SessionRegistry::new(),
                requests: Vec::new(),
                resolved_at_call: HashMap::new(),
            }
        }
    }

    impl Controller for RecordingController {
        fn id(&self) -> ControllerId {
            self.id
        }

        fn compute_path(&mut self, self_address: MacAddress, switch_ports: &PortMap, host_ports: &PortMap, policy: PathPolicy) {
            let resolved = switch_ports
                .values()
                .map(|neighbor| self.registry.is_registered(*neighbor))
                .collect();
            self.resolved_at_call.insert(self_address, resolved);
            self.requests.push(PathRequest {
                self_address,
                switch_ports: switch_ports.clone(),
                host_ports: host_ports.clone(),
                policy,
            });
        }

        fn register_device(&mut self, device: SwitchDeviceId, address: MacAddress) {
            self.registry.register_device(device, address);
        }

        fn registry(&self) -> &SessionRegistry {
            &self.registry
        }

        fn path_requests(&self) -> &[PathRequest] {
            &self.requests
        }
    }

    /// Three switches in a ring with h0 on s0 and h1 on s2, built by hand.
    struct Ring {
        fabric: Fabric,
        switches: Vec<NodeId>,
        installers: Vec<SwitchInstaller>,
        ports: Vec<PortList>,
    }

    fn ring() -> Ring {
        let mut fabric = Fabric::new();
        let switches: Vec<NodeId> = (0..3)
            .map(|i| fabric.create_named_node(&format!("s{}", i)).unwrap())
            .collect();
        let h0 = fabric.create_named_node("h0").unwrap();
        let h1 = fabric.create_named_node("h1").unwrap();

        let mut switch_links: Vec<Vec<NetDeviceId>> = vec![Vec::new(); 3];
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            let (pa, pb) = fabric.connect(switches[a], switches[b]).unwrap();
            switch_links[a].push(pa);
            switch_links[b].push(pb);
        }
        let (_, h0_port) = fabric.connect(h0, switches[0]).unwrap();
        let (_, h1_port) = fabric.connect(h1, switches[2]).unwrap();

        let mut installers = Vec::new();
        let mut ports = Vec::new();
        for (i, links) in switch_links.iter().enumerate() {
            let mut installer = SwitchInstaller::new();
            let mut list = PortList::new();
            for port in links {
                list = installer.attach_switch_link(&fabric, list, *port).unwrap();
            }
            if i == 0 {
                list = installer.attach_host_link(&fabric, list, h0_port).unwrap();
            }
            if i == 2 {
                list = installer.attach_host_link(&fabric, list, h1_port).unwrap();
            }
            installers.push(installer);
            ports.push(list);
        }

        Ring {
            fabric,
            switches,
            installers,
            ports,
        }
    }

    #[test]
    fn test_keys_are_assigned_per_map_in_call_order() {
        let mut fabric = Fabric::new();
        let switch = fabric.create_node();
        let mut installer = SwitchInstaller::new();

        let h0 = MacAddress::from_index(100);
        let s1 = MacAddress::from_index(101);
        let h2 = MacAddress::from_index(102);

        let mut list = PortList::new();
        list = installer.attach_host_neighbor(list, NetDeviceId(10), h0);
        list = installer.attach_switch_neighbor(list, NetDeviceId(11), s1);
        list = installer.attach_host_neighbor(list, NetDeviceId(12), h2);

        let topology = installer.topology();
        assert_eq!(topology.host_ports().get(&0), Some(&h0));
        assert_eq!(topology.host_ports().get(&1), Some(&h2));
        assert_eq!(topology.switch_ports().get(&0), Some(&s1));

        // Combined order is call order; device port numbers follow it
        assert_eq!(list, vec![NetDeviceId(10), NetDeviceId(11), NetDeviceId(12)]);
        assert_eq!(topology.device_port(PortRef::host(0)), Some(0));
        assert_eq!(topology.device_port(PortRef::switch(0)), Some(1));
        assert_eq!(topology.device_port(PortRef::host(1)), Some(2));
        assert!(fabric.switch_on_node(switch).is_none());
    }

    #[test]
    fn test_device_ports_preserve_combined_order() {
        let mut ring = ring();
        let mut controller = LearningController::default();

        for i in 0..3 {
            let device = ring.installers[i]
                .install(&mut ring.fabric, ring.switches[i], &ring.ports[i], &mut controller)
                .unwrap();
            let switch = ring.fabric.switch_device(device).unwrap();
            assert_eq!(switch.ports(), ring.ports[i].as_slice());
            for (number, port) in ring.ports[i].iter().enumerate() {
                assert_eq!(switch.port_number(*port), Some(number as u32));
            }
        }
    }

    #[test]
    fn test_one_path_request_per_install_with_snapshot() {
        let mut ring = ring();
        let mut controller = LearningController::default();

        let device = ring.installers[1]
            .install(&mut ring.fabric, ring.switches[1], &ring.ports[1], &mut controller)
            .unwrap();
        assert_eq!(controller.path_requests().len(), 1);
        let before = controller.path_requests()[0].clone();

        // A late attach is refused: the map, the list, the request and the
        // device all stay as they were at install time
        let late = ring.installers[1].attach_host_neighbor(ring.ports[1].clone(), NetDeviceId(999), MacAddress::from_index(999));
        assert_eq!(late, ring.ports[1]);
        assert!(ring.installers[1].topology().host_ports().is_empty());
        assert_eq!(ring.installers[1].topology().len(), 2);
        assert!(ring.installers[1].topology().is_sealed());

        assert_eq!(controller.path_requests().len(), 1);
        assert_eq!(controller.path_requests()[0], before);
        assert!(before.host_ports.is_empty());
        assert_eq!(ring.fabric.switch_device(device).unwrap().ports().len(), 2);
    }

    #[test]
    fn test_registration_is_visible_only_to_later_installs() {
        let mut ring = ring();
        let mut controller = RecordingController::new();

        ring.installers[0]
            .install(&mut ring.fabric, ring.switches[0], &ring.ports[0], &mut controller)
            .unwrap();
        ring.installers[1]
            .install(&mut ring.fabric, ring.switches[1], &ring.ports[1], &mut controller)
            .unwrap();

        let s0 = ring.fabric.first_address(ring.switches[0]).unwrap();
        let s1 = ring.fabric.first_address(ring.switches[1]).unwrap();

        // s0 saw no registered neighbor; s1 saw s0 but not s2
        assert_eq!(controller.resolved_at_call[&s0], vec![false, false]);
        let s1_view = &controller.resolved_at_call[&s1];
        let s1_request = &controller.requests[1];
        for (resolved, neighbor) in s1_view.iter().zip(s1_request.switch_ports.values()) {
            assert_eq!(*resolved, *neighbor == s0);
        }
        assert_eq!(s1_view.iter().filter(|r| **r).count(), 1);
    }

    #[test]
    fn test_policy_is_read_at_install_time() {
        let mut ring = ring();
        let mut controller = LearningController::default();

        ring.installers[0].toggle_traffic_mode();
        ring.installers[0].toggle_traffic_mode();
        ring.installers[1].toggle_traffic_mode();

        for i in 0..2 {
            ring.installers[i]
                .install(&mut ring.fabric, ring.switches[i], &ring.ports[i], &mut controller)
                .unwrap();
        }
        // Toggling after install changes nothing already requested
        ring.installers[0].toggle_traffic_mode();

        assert_eq!(controller.path_requests()[0].policy, PathPolicy::LowLatency);
        assert_eq!(controller.path_requests()[1].policy, PathPolicy::HighThroughput);
    }

    #[test]
    fn test_sequential_ring_install() {
        let mut ring = ring();
        let mut controller = LearningController::default();

        for i in 0..3 {
            ring.installers[i]
                .install(&mut ring.fabric, ring.switches[i], &ring.ports[i], &mut controller)
                .unwrap();
        }

        let identity = |node: NodeId| ring.fabric.first_address(node).unwrap();
        let h0 = identity(ring.fabric.find_node("h0").unwrap());
        let h1 = identity(ring.fabric.find_node("h1").unwrap());

        let requests = controller.path_requests();
        assert_eq!(requests.len(), 3);
        for (i, request) in requests.iter().enumerate() {
            assert_eq!(request.self_address, identity(ring.switches[i]));

            // Exactly the two ring neighbors, nothing else
            let neighbors: BTreeSet<MacAddress> = request.switch_ports.values().copied().collect();
            let expected: BTreeSet<MacAddress> = [ring.switches[(i + 1) % 3], ring.switches[(i + 2) % 3]]
                .into_iter()
                .map(identity)
                .collect();
            assert_eq!(request.switch_ports.len(), 2);
            assert_eq!(neighbors, expected, "wrong neighbors for s{}", i);
        }
        assert_eq!(requests[0].host_ports.len(), 1);
        assert_eq!(requests[0].host_ports[&0], h0);
        assert!(requests[1].host_ports.is_empty());
        assert_eq!(requests[2].host_ports.len(), 1);
        assert_eq!(requests[2].host_ports[&0], h1);

        let registered = controller.registry().devices();
        assert_eq!(registered.len(), 3);
        for node in &ring.switches {
            let address = ring.fabric.first_address(*node).unwrap();
            assert_eq!(controller.resolve(address), ring.fabric.switch_on_node(*node));
        }

        // s2 installed last, so it knows both hosts
        let s2 = identity(ring.switches[2]);
        let table = controller.forwarding_table(s2).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[&h0].hops, 1);
    }

    #[test]
    fn test_planned_ring_sees_every_host() {
        let mut plan = FabricPlan::new();
        for name in ["s0", "s1", "s2"] {
            plan.add_switch(name).unwrap();
        }
        plan.link_switches("s0", "s1").unwrap();
        plan.link_switches("s1", "s2").unwrap();
        plan.link_switches("s2", "s0").unwrap();
        plan.add_host("h0", "s0").unwrap();
        plan.add_host("h1", "s2").unwrap();

        let mut fabric = Fabric::new();
        let mut controller = LearningController::default();
        let layout = plan.activate(&mut fabric, &mut controller).unwrap();

        assert_eq!(controller.path_requests().len(), 3);
        assert_eq!(controller.registry().devices().len(), 3);
        for switch in &layout.switches {
            let table = controller.forwarding_table(switch.address).unwrap();
            assert_eq!(table.len(), 2, "switch {} is missing hosts", switch.name);
        }
    }
}
