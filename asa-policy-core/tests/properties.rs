use std::net::{IpAddr, Ipv4Addr};

use asa_policy_core::{
    field_key_for, AddressClassifier, AddressKind, HardwareId, RouteEntry, RouteTable,
};
use ipnetwork::{IpNetwork, Ipv4Network};
use proptest::prelude::*;

const ZONES: &[&str] = &["inside", "lab", "weblab", "management", "outside"];

fn route_strategy() -> impl Strategy<Value = RouteEntry> {
    (any::<u32>(), 0u8..=32, 0usize..ZONES.len()).prop_map(|(addr, prefix, zone)| {
        let net = Ipv4Network::new(Ipv4Addr::from(addr), prefix).expect("prefix <= 32");
        RouteEntry::new(
            IpNetwork::V4(net),
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            ZONES[zone],
            HardwareId::from_object_id("GigabitEthernet0_API_SLASH_0"),
        )
    })
}

proptest! {
    #[test]
    fn slash_literals_are_networks_unless_any(literal in "[a-z0-9.:-]{0,12}/[a-z0-9.:/-]{0,12}") {
        let classifier = AddressClassifier::default();
        prop_assert_eq!(classifier.classify(&literal), AddressKind::Network);

        let custom = AddressClassifier::new(&[literal.as_str()], &["any"], "^grp-", "^obj-")
            .expect("patterns");
        prop_assert_eq!(custom.classify(&literal), AddressKind::Any);
    }

    #[test]
    fn classification_and_field_key_are_stable(literal in ".{0,40}") {
        let classifier = AddressClassifier::default();
        let first = classifier.classify(&literal);
        prop_assert_eq!(first, classifier.classify(&literal));
        prop_assert_eq!(field_key_for(first), field_key_for(classifier.classify(&literal)));
    }

    #[test]
    fn resolution_picks_longest_non_management_prefix(
        routes in proptest::collection::vec(route_strategy(), 0..12),
        target in any::<u32>(),
    ) {
        let address = IpAddr::V4(Ipv4Addr::from(target));
        let table = RouteTable::from_entries(routes.clone());

        let expected = routes
            .iter()
            .filter(|r| r.zone() != "management" && r.contains(address))
            .fold(None::<&RouteEntry>, |best, r| match best {
                Some(b) if b.prefix_len() >= r.prefix_len() => Some(b),
                _ => Some(r),
            });

        let resolved = table.resolve_zone(&address.to_string()).ok();
        prop_assert_eq!(resolved, expected);
        if let Some(entry) = resolved {
            prop_assert_ne!(entry.zone(), "management");
        }
    }
}
