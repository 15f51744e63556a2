//! 主文件与元素值封装测试

mod common;

use common::{mock_loader, serial, test_config};
use xelib::{OnError, Session};

fn open_session() -> (Session, std::rc::Rc<std::cell::RefCell<common::MockState>>) {
    let (loader, state) = mock_loader();
    let mut session = Session::with_loader(test_config(), loader);
    session.open().unwrap();
    (session, state)
}

#[test]
fn test_add_all_masters_skips_hardcoded_and_stops_at_self() -> anyhow::Result<()> {
    let _serial = serial();
    let (mut session, state) = open_session();

    let file = session.file_by_name("Dawnguard.esm")?;
    let added = session.add_all_masters(file, OnError::Raise)?;

    assert_eq!(added, 2);
    assert_eq!(
        state.borrow().masters["Dawnguard.esm"],
        vec!["Skyrim.esm", "Update.esm"]
    );

    session.close()?;
    Ok(())
}

#[test]
fn test_get_available_masters() -> anyhow::Result<()> {
    let _serial = serial();
    let (mut session, _state) = open_session();

    let file = session.file_by_name("MyMod.esp")?;
    session.add_master(file, "Skyrim.esm", OnError::Raise)?;

    let available = session.get_available_masters(file, OnError::Raise)?;
    assert_eq!(
        available,
        vec!["Skyrim.Hardcoded.dat", "Update.esm", "Dawnguard.esm"]
    );
    assert_eq!(session.get_master_names(file, OnError::Raise)?, vec!["Skyrim.esm"]);

    session.close()?;
    Ok(())
}

#[test]
fn test_master_handles_are_scoped() -> anyhow::Result<()> {
    let _serial = serial();
    let (mut session, state) = open_session();
    let file = session.file_by_name("MyMod.esp")?;
    session.add_master(file, "Skyrim.esm", OnError::Raise)?;
    session.add_master(file, "Update.esm", OnError::Raise)?;

    let masters = session.with_handles(|session| {
        let masters = session.get_masters(file, OnError::Raise)?;
        assert_eq!(session.handles().current_layer().len(), 2);
        Ok(masters)
    })?;

    assert_eq!(masters.len(), 2);
    for master in &masters {
        assert_eq!(state.borrow().released_count(*master), 1);
    }
    assert!(session.handles().contains(file));

    session.close()?;
    Ok(())
}

#[test]
fn test_call_error_names_call_and_element() {
    let _serial = serial();
    let (mut session, _state) = open_session();
    let file = session.file_by_name("Update.esm").unwrap();

    // mock 未实现 SortMasters
    let err = session.sort_masters(file, OnError::Raise).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to sort masters in: [00] Update.esm: call to SortMasters failed"
    );
    assert!(!session.sort_masters(file, OnError::Ignore).unwrap());

    // 无法解析路径时退回句柄数值
    let err = session.clean_masters(4242, OnError::Raise).unwrap_err();
    assert!(err.to_string().contains("Failed to clean masters in: 4242"));

    session.close().unwrap();
}

#[test]
fn test_element_values() -> anyhow::Result<()> {
    let _serial = serial();
    let (mut session, _state) = open_session();
    let file = session.file_by_name("Skyrim.esm")?;

    assert_eq!(session.name(file)?, "Skyrim.esm");
    assert_eq!(session.path(file)?, "[00] Skyrim.esm");
    assert_eq!(session.get_value(file, "EDID", OnError::Raise)?, "IronSword");
    assert_eq!(session.get_value(file, "FULL", OnError::Raise)?, "");
    assert!(session.get_flag(file, "Record Header\\Record Flags", "ESM")?);
    assert!(!session.get_flag(file, "Record Header\\Record Flags", "Localized")?);

    // 值读取失败可以被忽略
    assert_eq!(session.get_value(9999, "EDID", OnError::Ignore)?, "");
    assert_eq!(session.get_int_value(file, "DATA\\Value", OnError::Ignore)?, 0);

    let err = session.get_int_value(file, "DATA\\Value", OnError::Raise).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Failed to get int value at [00] Skyrim.esm, \"DATA\\Value\""));

    session.close()?;
    Ok(())
}

#[test]
fn test_signature_name_map_last_wins() -> anyhow::Result<()> {
    let _serial = serial();
    let (mut session, _state) = open_session();

    let map = session.signature_name_map()?;
    assert_eq!(map.len(), 2);
    assert_eq!(map["ARMO"], "Armour");
    assert_eq!(map["WEAP"], "Weapon");

    session.close()?;
    Ok(())
}

#[test]
fn test_get_element_ignored_failure_is_not_tracked() -> anyhow::Result<()> {
    let _serial = serial();
    let (mut session, _state) = open_session();
    let file = session.file_by_name("Skyrim.esm")?;

    let element = session.get_element(file, "NPC_", OnError::Ignore)?;
    assert_eq!(element, 0);
    assert_eq!(session.handles().all_handles().len(), 1);

    session.close()?;
    Ok(())
}

#[test]
fn test_set_game_path_while_open() -> anyhow::Result<()> {
    let _serial = serial();
    let (mut session, state) = open_session();

    session.set_game_path("E:\\Stock Game")?;
    assert_eq!(state.borrow().game_path.as_deref(), Some("E:\\Stock Game"));
    assert_eq!(
        session.config().game_path.as_deref(),
        Some(std::path::Path::new("E:\\Stock Game"))
    );

    session.close()?;
    Ok(())
}
