//! Integration tests for the configuration service: persistence across
//! sessions, preset round-trips, and the UI feedback contract.

mod common;

use citygrid_sim::config::{ComponentKind, ConfigEvent, ConfigurationService, names};
use citygrid_sim::error::feedback;
use common::{open_service, store_path};

#[test]
fn overrides_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut service = open_service(&dir);
        service
            .save(ComponentKind::Source, names::P_NOM_MW, 2500.0)
            .unwrap();
        service
            .save(ComponentKind::InductiveLoad, names::P_DEMAND_MW, 12.0)
            .unwrap();
    }

    let service = ConfigurationService::open(store_path(&dir)).unwrap();
    assert_eq!(
        service.effective(ComponentKind::Source)[names::P_NOM_MW],
        2500.0
    );
    assert_eq!(
        service.effective(ComponentKind::InductiveLoad)[names::P_DEMAND_MW],
        12.0
    );
    // Untouched parameters still resolve to seeded defaults.
    assert_eq!(
        service.effective(ComponentKind::Source)[names::V_NOM_KV],
        110.0
    );
}

#[test]
fn reset_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut service = open_service(&dir);
        service
            .save(ComponentKind::Source, names::P_NOM_MW, 2500.0)
            .unwrap();
        service
            .save(ComponentKind::Source, names::V_NOM_KV, 220.0)
            .unwrap();
        service.reset(ComponentKind::Source, None).unwrap();
    }

    let service = ConfigurationService::open(store_path(&dir)).unwrap();
    assert_eq!(
        service.effective(ComponentKind::Source)[names::P_NOM_MW],
        1000.0
    );
    assert_eq!(
        service.effective(ComponentKind::Source)[names::V_NOM_KV],
        110.0
    );
}

#[test]
fn presets_persist_and_round_trip_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let id;

    {
        let mut service = open_service(&dir);
        service
            .save(ComponentKind::CapacitiveLoad, names::P_DEMAND_MW, 8.0)
            .unwrap();
        service
            .save_preset("capacitor bank", ComponentKind::CapacitiveLoad, "substation")
            .unwrap();
        id = service.presets(None)[0].id;

        // Later override must not leak into the stored snapshot.
        service
            .save(ComponentKind::CapacitiveLoad, names::P_DEMAND_MW, 60.0)
            .unwrap();
    }

    let service = ConfigurationService::open(store_path(&dir)).unwrap();
    let presets = service.presets(Some(ComponentKind::CapacitiveLoad));
    assert_eq!(presets.len(), 1);
    assert_eq!(presets[0].name, "capacitor bank");
    assert_eq!(presets[0].description, "substation");

    let snapshot = service.load_preset(id).unwrap();
    assert_eq!(snapshot[names::P_DEMAND_MW], 8.0);
    assert_eq!(snapshot[names::POWER_FACTOR], 0.9);
}

#[test]
fn preset_ids_are_not_reused_after_delete() {
    let dir = tempfile::tempdir().unwrap();

    let first_id;
    {
        let mut service = open_service(&dir);
        service.save_preset("A", ComponentKind::Source, "").unwrap();
        first_id = service.presets(None)[0].id;
        service.delete_preset(first_id).unwrap();
    }

    let mut service = ConfigurationService::open(store_path(&dir)).unwrap();
    service.save_preset("B", ComponentKind::Source, "").unwrap();
    let second_id = service.presets(None)[0].id;
    assert!(second_id > first_id);
}

#[test]
fn feedback_contract_matches_ui_expectations() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = open_service(&dir);

    let result = service.save(ComponentKind::Source, names::P_NOM_MW, 2000.0);
    assert_eq!(
        feedback(&result),
        (true, "Configuration saved successfully".to_string())
    );

    let result = service.save(ComponentKind::Source, names::P_NOM_MW, 6000.0);
    let (success, message) = feedback(&result);
    assert!(!success);
    assert_eq!(message, "value must be between 100 and 5000 MW");

    let result = service.save_preset("", ComponentKind::Source, "");
    assert_eq!(feedback(&result), (false, "a name is required".to_string()));

    let result = service.load_preset(999);
    let (success, message) = feedback(&result.map(|_| "loaded"));
    assert!(!success);
    assert_eq!(message, "no saved instance with id 999");
}

#[test]
fn ui_refresh_flow_sees_preset_events() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let dir = tempfile::tempdir().unwrap();
    let mut service = open_service(&dir);

    // A sidebar would refresh its preset list on these tags.
    let tags = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&tags);
    service.subscribe(move |event: ConfigEvent| sink.borrow_mut().push(event.as_str()));

    service.save_preset("A", ComponentKind::Source, "").unwrap();
    let id = service.presets(None)[0].id;
    service.delete_preset(id).unwrap();
    service
        .save(ComponentKind::Source, names::V_NOM_KV, 220.0)
        .unwrap();

    assert_eq!(
        &*tags.borrow(),
        &["instance_saved", "instance_deleted", "config_changed"]
    );
}
