//! A todo list mixing typed containers, a plain reducer and an unscoped
//! update function in one tree.

use reduxable::{
    bind, combine, Action, CentralStore, Container, Intent, Node, Reducer, SliceState,
    StateStore, UpdateFn,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Todo {
    id: u64,
    text: String,
    completed: bool,
}

fn todos() -> Container {
    Container::builder()
        .initial_state(json!([]))
        .typed_operation("addTodo", |mut todos: Vec<Todo>, text: String| {
            let id = todos.iter().map(|t| t.id + 1).max().unwrap_or(0);
            todos.push(Todo {
                id,
                text,
                completed: false,
            });
            todos
        })
        .typed_operation("toggleTodo", |todos: Vec<Todo>, id: u64| {
            todos
                .into_iter()
                .map(|t| Todo {
                    completed: if t.id == id { !t.completed } else { t.completed },
                    ..t
                })
                .collect::<Vec<_>>()
        })
        .typed_operation("clearCompleted", |todos: Vec<Todo>, _: ()| {
            todos.into_iter().filter(|t| !t.completed).collect::<Vec<_>>()
        })
        .build()
        .unwrap()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
struct Visibility(String);

impl Default for Visibility {
    fn default() -> Self {
        Self("SHOW_ALL".to_string())
    }
}

impl SliceState for Visibility {}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "payload")]
enum VisibilityIntent {
    #[serde(rename = "setVisibilityFilter")]
    Set(String),
}

impl Intent for VisibilityIntent {}

struct VisibilityReducer;

impl Reducer for VisibilityReducer {
    type State = Visibility;
    type Intent = VisibilityIntent;

    fn reduce(_state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            VisibilityIntent::Set(filter) => Visibility(filter),
        }
    }
}

fn app() -> (Container, reduxable::Subtree) {
    let todos = todos();
    let tree = combine([
        ("todos", Node::from(todos.clone())),
        (
            "visibilityFilter",
            Node::from(UpdateFn::from_reducer::<VisibilityReducer>()),
        ),
        (
            "lastAction",
            Node::update(|state, action| {
                if action.kind == reduxable::INIT_ACTION_TYPE {
                    state.unwrap_or(json!(null))
                } else {
                    json!(action.kind)
                }
            }),
        ),
    ])
    .unwrap();
    (todos, tree)
}

#[test]
fn initial_tree_combines_every_node_kind() {
    let (_, tree) = app();
    assert_eq!(
        tree.initial_state(),
        json!({ "todos": [], "visibilityFilter": "SHOW_ALL", "lastAction": null })
    );
}

#[test]
fn todos_flow_through_the_store() {
    let (todos, tree) = app();
    let store = bind(tree, CentralStore::create);

    todos.invoke("addTodo", Some(json!("write tests"))).unwrap();
    todos.invoke("addTodo", Some(json!("ship"))).unwrap();
    todos.invoke("toggleTodo", Some(json!(0))).unwrap();

    let current: Vec<Todo> = todos.current_as().unwrap();
    assert_eq!(current.len(), 2);
    assert!(current[0].completed);
    assert!(!current[1].completed);
    assert_eq!(store.get_state()["lastAction"], json!("toggleTodo"));

    todos.invoke("clearCompleted", None).unwrap();
    assert_eq!(
        store.get_state()["todos"],
        json!([{ "id": 1, "text": "ship", "completed": false }])
    );
}

#[test]
fn reducer_sees_unscoped_actions_only_by_type() {
    let (todos, tree) = app();
    let store = bind(tree, CentralStore::create);

    store
        .dispatch(Action::new("setVisibilityFilter").with_payload(json!("SHOW_COMPLETED")))
        .unwrap();
    todos.invoke("addTodo", Some(json!("x"))).unwrap();

    let state = store.get_state();
    assert_eq!(state["visibilityFilter"], json!("SHOW_COMPLETED"));
    assert_eq!(state["todos"].as_array().map(Vec::len), Some(1));
}

#[test]
fn bad_payload_leaves_todos_unchanged() {
    let (todos, tree) = app();
    let _store = bind(tree, CentralStore::create);

    todos.invoke("addTodo", Some(json!("first"))).unwrap();
    let before = todos.current_slice();
    todos.invoke("toggleTodo", Some(json!("not an id"))).unwrap();
    assert_eq!(todos.current_slice(), before);
}

#[test]
fn operation_handles_route_like_invoke() {
    let todos = todos();
    let add = todos.operation("addTodo").unwrap();
    assert_eq!(add.name(), "addTodo");
    assert_eq!(
        add.action(Some(json!("a"))),
        Action::new("addTodo").with_payload(json!("a"))
    );

    add.call(Some(json!("a"))).unwrap();
    assert_eq!(todos.current_as::<Vec<Todo>>().unwrap().len(), 1);
    assert!(todos.operation("removeTodo").is_none());
    assert!(todos.invoke("removeTodo", None).is_err());
}
