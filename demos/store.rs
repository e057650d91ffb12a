//! Store example with complex state

use watchbox::Store;

#[derive(Clone, Debug, PartialEq)]
struct TodoItem {
    id: usize,
    text: String,
    completed: bool,
}

#[derive(Clone, Debug, PartialEq)]
struct AppState {
    todos: Vec<TodoItem>,
    filter: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("watchbox=debug")
        .init();

    println!("=== Store Example ===\n");

    // Create a store with initial state
    let store = Store::builder(AppState {
        todos: vec![],
        filter: "all".to_string(),
    })
    .name("todos")
    .build();

    // Subscribe to state changes; runs once right away
    let unsubscribe = store.subscribe(|state| {
        println!(
            "State updated! Active todos: {}",
            state.todos.iter().filter(|t| !t.completed).count()
        );
    });

    // Add a todo
    println!("\nAdding todo...");
    store.modify(|state| {
        state.todos.push(TodoItem {
            id: 1,
            text: "Learn Watchbox".to_string(),
            completed: false,
        });
    });

    // Complete the todo
    println!("\nCompleting todo...");
    store.modify(|state| {
        if let Some(todo) = state.todos.first_mut() {
            todo.completed = true;
        }
    });

    // Same state again: no notification
    println!("\nSetting identical state...");
    store.set(store.get());

    // Back to the start, then stop listening
    println!("\nResetting...");
    store.reset();
    unsubscribe.unsubscribe();

    // Read final state
    println!("\nFinal state: {:#?}", store.get());
}
