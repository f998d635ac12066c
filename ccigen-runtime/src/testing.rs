//! Scripted foreign objects for unit tests.

use crate::error::ForeignError;
use crate::foreign::ForeignObject;
use ccigen_tree::ScopedName;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub(crate) struct MockObject {
    id: String,
    interfaces: Vec<ScopedName>,
    refs: Cell<i64>,
    fail_add_ref: bool,
    fail_release: bool,
    grants: RefCell<HashMap<String, Rc<MockObject>>>,
}

impl MockObject {
    pub(crate) fn new(id: &str, interfaces: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            interfaces: interfaces.iter().map(|s| ScopedName::parse(s)).collect(),
            refs: Cell::new(0),
            fail_add_ref: false,
            fail_release: false,
            grants: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn failing_add_ref(mut self) -> Self {
        self.fail_add_ref = true;
        self
    }

    pub(crate) fn failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    pub(crate) fn grant(&self, id: &str, object: Rc<MockObject>) {
        self.grants.borrow_mut().insert(id.to_string(), object);
    }

    pub(crate) fn app_refs(&self) -> i64 {
        self.refs.get()
    }
}

impl ForeignObject for MockObject {
    fn repository_id(&self) -> &str {
        &self.id
    }

    fn add_ref(&self) -> Result<(), ForeignError> {
        if self.fail_add_ref {
            return Err(ForeignError::new("IDL:omg.org/CORBA/NO_PERMISSION:1.0", 1));
        }
        self.refs.set(self.refs.get() + 1);
        Ok(())
    }

    fn release_ref(&self) -> Result<(), ForeignError> {
        self.refs.set(self.refs.get() - 1);
        if self.fail_release {
            return Err(ForeignError::new("IDL:omg.org/CORBA/COMM_FAILURE:1.0", 2));
        }
        Ok(())
    }

    fn narrow(&self, interface: &ScopedName) -> bool {
        self.interfaces.contains(interface)
    }

    fn query_interface(&self, id: &str) -> Option<Rc<dyn ForeignObject>> {
        let granted = self.grants.borrow().get(id).cloned()?;
        granted.refs.set(granted.refs.get() + 1);
        Some(granted)
    }
}
