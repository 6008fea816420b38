//! Builds a small source tree, resolves a second-order rule document, and
//! prints the projected visible graph along with the engine's debug tracing.

use indexmap::IndexSet;

use archmap_core::{resolve, Node, SecondOrderRule};
use archmap_view::Projector;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut root = Node::root("module");
    root.set_name("app");
    let mut window = Node::named("class", "app.Window");
    window.add_child(Node::named("function", "app.Window.draw"));
    window.add_child(Node::named("function", "app.Window.resize"));
    let mut store = Node::named("class", "app.Store");
    store.add_child(Node::named("function", "app.Store.load"));
    let draw = window.children()[0].id();
    let load = store.children()[0].id();
    let store_id = store.id();
    root.add_child(window);
    root.add_child(store);
    root.add_arc(draw, store_id).unwrap();
    root.add_arc(draw, load).unwrap();

    let mut rules = IndexSet::new();
    rules.insert(SecondOrderRule::UnfoldScope {
        scope: "module".into(),
    });
    rules.insert(SecondOrderRule::UnfoldNodes {
        pattern: "^Window$".into(),
    });

    let resolved = resolve(&root, &rules);
    let graph = Projector::default().project(&root, &resolved);

    for node in graph.roots() {
        print!("{node}");
    }
    for arc in graph.arcs() {
        println!("{} -> {} (weight {})", arc.source, arc.destination, arc.weight);
    }
}
