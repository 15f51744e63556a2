//! 测试用的 XEditLib mock
//!
//! 状态放在 `Rc<RefCell<..>>` 中，库被"卸载"（丢弃）后测试仍可检查调用记录。
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use xelib::native::WordBool;
use xelib::{Handle, LibraryLoader, NativeApi, Result, SessionConfig, XelibError};

static SESSION_LOCK: Mutex<()> = Mutex::new(());

/// 同一进程只能打开一个会话，打开会话的测试需要串行执行
pub fn serial() -> MutexGuard<'static, ()> {
    SESSION_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct MockState {
    pub initialized: usize,
    pub finalized: usize,
    pub unloaded: usize,
    pub released: Vec<Handle>,
    pub fail_release: HashSet<Handle>,
    pub game_mode: Option<i32>,
    pub game_path: Option<String>,
    pub load_order: Option<String>,
    /// 加载器在返回 Done 之前报告 Active 的次数；None 表示永远 Active
    pub active_polls: Option<usize>,
    pub status_polls: usize,
    pub loader_error: bool,
    pub exception: String,
    /// 按加载顺序排列的文件名
    pub files: Vec<String>,
    pub masters: HashMap<String, Vec<String>>,
    /// 句柄 → 文件名
    pub open_handles: HashMap<Handle, String>,
    pub next_handle: Handle,
    pub result_string: Vec<u16>,
    pub result_array: Vec<u32>,
}

impl MockState {
    fn open_file_handle(&mut self, name: &str) -> Handle {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.open_handles.insert(handle, name.to_string());
        handle
    }

    fn set_result(&mut self, text: &str, len: &mut i32) {
        self.result_string = text.encode_utf16().collect();
        *len = self.result_string.len() as i32;
    }

    fn file_of(&self, id: Handle) -> Option<String> {
        self.open_handles.get(&id).cloned()
    }

    pub fn released_count(&self, handle: Handle) -> usize {
        self.released.iter().filter(|&&h| h == handle).count()
    }
}

pub struct MockLib {
    state: Rc<RefCell<MockState>>,
}

impl Drop for MockLib {
    fn drop(&mut self) {
        self.state.borrow_mut().unloaded += 1;
    }
}

impl NativeApi for MockLib {
    fn initialize(&self) -> bool {
        self.state.borrow_mut().initialized += 1;
        true
    }

    fn finalize(&self) -> bool {
        self.state.borrow_mut().finalized += 1;
        true
    }

    fn get_result_string(&self, buffer: &mut [u16]) -> bool {
        let state = self.state.borrow();
        if buffer.len() > state.result_string.len() {
            return false;
        }
        buffer.copy_from_slice(&state.result_string[..buffer.len()]);
        true
    }

    fn get_result_array(&self, buffer: &mut [u32]) -> bool {
        let state = self.state.borrow();
        if buffer.len() > state.result_array.len() {
            return false;
        }
        buffer.copy_from_slice(&state.result_array[..buffer.len()]);
        true
    }

    fn get_exception_message(&self, len: &mut i32) -> bool {
        let mut state = self.state.borrow_mut();
        let message = state.exception.clone();
        state.set_result(&message, len);
        true
    }

    fn release(&self, id: Handle) -> bool {
        let mut state = self.state.borrow_mut();
        state.released.push(id);
        state.open_handles.remove(&id);
        !state.fail_release.contains(&id)
    }

    fn set_game_mode(&self, mode: i32) -> bool {
        self.state.borrow_mut().game_mode = Some(mode);
        true
    }

    fn get_game_path(&self, _mode: i32, len: &mut i32) -> bool {
        let mut state = self.state.borrow_mut();
        let path = state
            .game_path
            .clone()
            .unwrap_or_else(|| "C:\\Steam\\Skyrim Special Edition\\".to_string());
        state.set_result(&path, len);
        true
    }

    fn set_game_path(&self, path: &str) -> bool {
        self.state.borrow_mut().game_path = Some(path.to_string());
        true
    }

    fn load_plugins(&self, load_order: &str, _smart_load: bool) -> bool {
        let mut state = self.state.borrow_mut();
        state.load_order = Some(load_order.to_string());
        let mut files = vec!["Skyrim.Hardcoded.dat".to_string()];
        files.extend(load_order.lines().map(str::to_string));
        state.files = files;
        true
    }

    fn get_loader_status(&self, status: &mut u8) -> bool {
        let mut state = self.state.borrow_mut();
        state.status_polls += 1;
        let still_active = match state.active_polls {
            Some(limit) => state.status_polls <= limit,
            None => true,
        };
        *status = if still_active {
            1
        } else if state.loader_error {
            3
        } else {
            2
        };
        true
    }

    fn get_loaded_file_names(&self, len: &mut i32) -> bool {
        let mut state = self.state.borrow_mut();
        let names = state.files.join("\r\n");
        state.set_result(&names, len);
        true
    }

    fn file_by_name(&self, name: &str, res: &mut Handle) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.files.iter().any(|file| file == name) {
            return false;
        }
        *res = state.open_file_handle(name);
        true
    }

    fn name(&self, id: Handle, len: &mut i32) -> bool {
        let mut state = self.state.borrow_mut();
        match state.file_of(id) {
            Some(name) => {
                state.set_result(&name, len);
                true
            }
            None => false,
        }
    }

    fn path(&self, id: Handle, _short: bool, _local: bool, len: &mut i32) -> bool {
        let mut state = self.state.borrow_mut();
        match state.file_of(id) {
            Some(name) => {
                state.set_result(&format!("[00] {}", name), len);
                true
            }
            None => false,
        }
    }

    fn get_value(&self, id: Handle, path: &str, len: &mut i32) -> bool {
        let mut state = self.state.borrow_mut();
        if state.file_of(id).is_none() {
            return false;
        }
        if path == "EDID" {
            state.set_result("IronSword", len);
        } else {
            *len = 0;
        }
        true
    }

    fn get_flag(&self, id: Handle, _path: &str, name: &str, res: &mut WordBool) -> bool {
        let state = self.state.borrow();
        if state.file_of(id).is_none() {
            return false;
        }
        *res = if name == "ESM" { 0xFFFF } else { 0 };
        true
    }

    fn get_signature_name_map(&self, len: &mut i32) -> bool {
        self.state
            .borrow_mut()
            .set_result("ARMO=Armor\nWEAP=Weapon\nARMO=Armour", len);
        true
    }

    fn add_master(&self, id: Handle, file_name: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(file) = state.file_of(id) else {
            return false;
        };
        state.masters.entry(file).or_default().push(file_name.to_string());
        true
    }

    fn get_masters(&self, id: Handle, len: &mut i32) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(file) = state.file_of(id) else {
            return false;
        };
        let masters = state.masters.get(&file).cloned().unwrap_or_default();
        let handles: Vec<Handle> = masters
            .iter()
            .map(|master| state.open_file_handle(master))
            .collect();
        *len = handles.len() as i32;
        state.result_array = handles;
        true
    }

    fn get_master_names(&self, id: Handle, len: &mut i32) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(file) = state.file_of(id) else {
            return false;
        };
        let names = state.masters.get(&file).cloned().unwrap_or_default().join("\r\n");
        state.set_result(&names, len);
        true
    }
}

pub struct MockLoader {
    pub state: Rc<RefCell<MockState>>,
    pub fail: bool,
}

impl LibraryLoader for MockLoader {
    fn load(&self) -> Result<Box<dyn NativeApi>> {
        if self.fail {
            return Err(XelibError::Load {
                path: "MockXEditLib.dll".into(),
                reason: "mock load failure".to_string(),
            });
        }
        Ok(Box::new(MockLib {
            state: Rc::clone(&self.state),
        }))
    }

    fn describe(&self) -> String {
        "MockXEditLib.dll".to_string()
    }
}

/// 插件加载立即完成的 mock
pub fn mock_loader() -> (MockLoader, Rc<RefCell<MockState>>) {
    let state = Rc::new(RefCell::new(MockState {
        active_polls: Some(0),
        ..Default::default()
    }));
    let loader = MockLoader {
        state: Rc::clone(&state),
        fail: false,
    };
    (loader, state)
}

pub fn test_config() -> SessionConfig {
    SessionConfig::new()
        .with_plugins(["Skyrim.esm", "Update.esm", "Dawnguard.esm", "MyMod.esp"])
        .with_poll_interval(Duration::from_millis(1))
}
