use modelstore_core::{
    DbError, JsonUnitSerializer, LocalCommunication, MemoryNotifier, ModelCommunication,
    ModelUnit, StoreConfig, StoreManager, UnitNode, UnitRepository,
};
use std::sync::Arc;

fn unit(name: &str) -> ModelUnit {
    ModelUnit::new(name, "EntityUnit")
        .with_node(UnitNode::public("Customer", "Entity"))
        .with_node(UnitNode::private("Secret", "Entity"))
}

fn communication<'s>(
    store: &'s StoreManager,
    notifier: &Arc<MemoryNotifier>,
) -> LocalCommunication<'s, JsonUnitSerializer> {
    LocalCommunication::new(UnitRepository::new(
        store,
        JsonUnitSerializer,
        notifier.clone(),
    ))
}

#[test]
fn callbacks_receive_lists_and_units() {
    let store = StoreManager::new(StoreConfig::in_memory());
    let notifier = Arc::new(MemoryNotifier::new());
    let comm = communication(&store, &notifier);

    comm.put_model_unit("Shop", "Customers", &unit("Customers"))
        .unwrap();
    comm.put_model_unit("Shop", "Orders", &unit("Orders")).unwrap();
    comm.put_model_unit("Blog", "Posts", &unit("Posts")).unwrap();

    let mut models = Vec::new();
    comm.load_model_list(&mut |names| models = names).unwrap();
    assert_eq!(models, vec!["Blog", "Shop"]);

    let mut units = Vec::new();
    comm.load_unit_list("Shop", &mut |names| units = names)
        .unwrap();
    assert_eq!(units, vec!["Customers", "Orders"]);

    let mut loaded = None;
    comm.load_model_unit("Shop", "Orders", &mut |u| loaded = Some(u))
        .unwrap();
    assert_eq!(loaded, Some(unit("Orders")));

    let mut interface = None;
    comm.load_model_unit_interface("Shop", "Orders", &mut |u| interface = Some(u))
        .unwrap();
    let interface = interface.unwrap();
    assert_eq!(interface.nodes.len(), 1);
    assert_eq!(interface.nodes[0].name, "Customer");
    assert!(notifier.messages().is_empty());
}

#[test]
fn invalid_name_reports_and_skips_write() {
    let store = StoreManager::new(StoreConfig::in_memory());
    let notifier = Arc::new(MemoryNotifier::new());
    let comm = communication(&store, &notifier);

    comm.put_model_unit("Shop", "bad name", &unit("bad name"))
        .unwrap();

    let mut units = vec!["sentinel".to_string()];
    comm.load_unit_list("Shop", &mut |names| units = names)
        .unwrap();
    assert!(units.is_empty());
    assert_eq!(notifier.messages().len(), 1);
    assert!(notifier.messages()[0].contains("bad name"));
}

#[test]
fn missing_unit_never_invokes_callback() {
    let store = StoreManager::new(StoreConfig::in_memory());
    let notifier = Arc::new(MemoryNotifier::new());
    let comm = communication(&store, &notifier);

    let mut calls = 0;
    comm.load_model_unit("Shop", "Ghost", &mut |_| calls += 1)
        .unwrap();
    comm.load_model_unit_interface("Shop", "Ghost", &mut |_| calls += 1)
        .unwrap();

    assert_eq!(calls, 0);
    assert_eq!(notifier.messages().len(), 2);
}

#[test]
fn rename_and_delete_through_contract() {
    let store = StoreManager::new(StoreConfig::in_memory());
    let notifier = Arc::new(MemoryNotifier::new());
    let comm = communication(&store, &notifier);

    comm.put_model_unit("Shop", "Draft", &unit("Draft")).unwrap();
    comm.rename_model_unit("Shop", "Draft", "Final", &unit("Final"))
        .unwrap();
    comm.put_model_unit("Shop", "Extra", &unit("Extra")).unwrap();

    let repo = comm.repository();
    assert_eq!(repo.list_units("Shop").unwrap(), vec!["Extra", "Final"]);

    comm.delete_model_unit("Shop", "Extra").unwrap();
    comm.delete_model_unit("Shop", "Extra").unwrap();
    assert_eq!(repo.list_units("Shop").unwrap(), vec!["Final"]);

    comm.delete_model("Shop").unwrap();
    assert!(repo.list_models().unwrap().is_empty());
}

#[test]
fn storage_failure_is_reported_and_returned() {
    let dir = tempfile::tempdir().unwrap();
    let store = StoreManager::new(StoreConfig::in_directory(dir.path().join("absent")));
    let notifier = Arc::new(MemoryNotifier::new());
    let comm = communication(&store, &notifier);

    let mut called = false;
    let err = comm
        .load_model_list(&mut |_| called = true)
        .unwrap_err();

    assert!(matches!(err, DbError::UnsupportedEnvironment { .. }));
    assert!(!called);
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("load_model_list failed"));
}

#[test]
fn contract_is_usable_as_trait_object() {
    let store = StoreManager::new(StoreConfig::in_memory());
    let notifier = Arc::new(MemoryNotifier::new());
    let comm: Box<dyn ModelCommunication<Unit = ModelUnit> + '_> =
        Box::new(communication(&store, &notifier));

    comm.put_model_unit("Shop", "Orders", &unit("Orders")).unwrap();
    let mut count = 0;
    comm.load_model_list(&mut |names| count = names.len())
        .unwrap();
    assert_eq!(count, 1);
}
