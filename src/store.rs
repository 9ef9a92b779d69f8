use std::sync::Mutex;

use crate::TodoItem;

/// Process-wide to-do list. Appends are serialized behind the mutex;
/// insertion order is the only ordering guarantee.
pub(crate) struct TodoStore {
    items: Mutex<Vec<TodoItem>>,
}

impl TodoStore {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn append(&self, item: TodoItem) {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.push(item);
    }

    pub(crate) fn list_all(&self) -> Vec<TodoItem> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn append_preserves_insertion_order() {
        let store = TodoStore::new();
        store.append(TodoItem {
            task: "buy milk".to_string(),
            due_date: None,
        });
        store.append(TodoItem {
            task: "call mom".to_string(),
            due_date: Some("today evening".to_string()),
        });
        let items = store.list_all();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].task, "buy milk");
        assert!(items[0].due_date.is_none());
        assert_eq!(items[1].due_date.as_deref(), Some("today evening"));
    }

    #[test]
    fn concurrent_appends_lose_nothing() {
        let store = Arc::new(TodoStore::new());
        let mut handles = Vec::new();
        for worker in 0..8 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    store.append(TodoItem {
                        task: format!("w{worker}-{i}"),
                        due_date: None,
                    });
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.list_all().len(), 400);
    }
}
