use std::{cell::Cell, rc::Rc, time::SystemTime};
use xml_reconciler::{
	host::XmlHost,
	props,
	reconcile::{Config, SchedulingMode},
	traced::Traced,
	vdom::{element, Element, Node, Value},
	Error, Renderer,
};


#[test]
fn string_children() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let link = element("link");
	let xml = renderer.render(target, link(props! { "foo" => "bar", "children" => "hello world" })).unwrap();

	assert_eq!(xml, r#"<link foo="bar">hello world</link>"#);
}

#[test]
fn nested_nodes() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let xml = renderer.render(target, Element::new("foo").children(Element::new("bar"))).unwrap();

	assert_eq!(xml, "<foo><bar/></foo>");
}

#[test]
fn error_on_bad_prop_type() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let jsx = Element::new("foo").with("asdf", Value::Object(Rc::new(SystemTime::now())));
	let error = renderer.render(target, jsx).unwrap_err();

	assert_eq!(error.to_string(), r#"Prop "asdf" had type object - all attributes must be string or number!"#);
	assert_eq!(renderer.markup(target), "");
}

#[test]
fn boolean_attribute_is_rejected_on_creation() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let error = renderer.render(target, Element::new("foo").with("flag", true)).unwrap_err();

	assert!(matches!(error, Error::InvalidPropertyType { ref name, .. } if name == "flag"));
	assert_eq!(error.to_string(), r#"Prop "flag" had type boolean - all attributes must be string or number!"#);
}

#[test]
fn failed_creation_leaves_nothing_behind() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let description = Element::new("foo").children(vec![
		Node::from(Element::new("ok").with("a", "1")),
		Element::new("bad").with("flag", Value::Object(Rc::new(()))).into(),
	]);
	renderer.render(target, description).unwrap_err();

	assert_eq!(renderer.markup(target), "");
	// Only the container itself is left.
	assert_eq!(renderer.host().document().len(), 1);
}

#[test]
fn failed_update_keeps_existing_nodes() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let first = Element::new("list").children(vec![Node::from(Element::new("item").with("n", 1))]);
	renderer.render(target, first).unwrap();

	let second = Element::new("list").children(vec![
		Node::from(Element::new("item").with("n", 1)),
		Element::new("item").with("n", Value::Object(Rc::new(()))).into(),
	]);
	renderer.render(target, second).unwrap_err();

	assert_eq!(renderer.markup(target), r#"<list><item n="1"/></list>"#);
}

#[test]
fn identical_rerender_is_idempotent() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let description: Node = Element::new("foo")
		.with("a", "1")
		.with("style", [("width", 10)].iter().copied().collect::<xml_reconciler::vdom::Style>())
		.children(vec![Node::text("hello"), Element::new("bar").with("b", 2).into()])
		.into();

	let first = renderer.render(target, description.clone()).unwrap();
	let mutations = renderer.host().document().mutation_count();
	let second = renderer.render(target, description).unwrap();

	assert_eq!(first, second);
	assert_eq!(first, r#"<foo a="1" style="width: 10px;">hello<bar b="2"/></foo>"#);
	assert_eq!(renderer.host().document().mutation_count(), mutations);
}

#[test]
fn rerender_patches_in_place() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	renderer.render(target, Element::new("foo").with("a", "1").children(Element::new("bar"))).unwrap();
	let document = renderer.host().document();
	let foo = document.children(target.container())[0];
	let bar = document.children(foo)[0];

	let xml = renderer
		.render(target, Element::new("foo").with("a", "2").with("b", "x").children(Element::new("bar")))
		.unwrap();

	assert_eq!(xml, r#"<foo a="2" b="x"><bar/></foo>"#);
	let document = renderer.host().document();
	assert_eq!(document.children(target.container()), &[foo]);
	assert_eq!(document.children(foo), &[bar]);
}

#[test]
fn falsy_values_remove_attributes_on_update() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	renderer.render(target, Element::new("foo").with("a", "1").with("b", "2").with("c", "3").with("d", "4")).unwrap();
	let xml = renderer
		.render(target, Element::new("foo").with("a", "").with("b", 0).with("c", Value::Null).with("d", false))
		.unwrap();

	// Zero is a number and stays.
	assert_eq!(xml, r#"<foo b="0"/>"#);
}

#[test]
fn dropped_property_removes_attribute() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	renderer.render(target, Element::new("foo").with("a", "1").with("b", "2")).unwrap();
	let xml = renderer.render(target, Element::new("foo").with("b", "2")).unwrap();

	assert_eq!(xml, r#"<foo b="2"/>"#);
}

#[test]
fn text_nodes_are_updated_in_place() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	renderer.render(target, Element::new("p").children(vec![Node::text("hello"), Element::new("br").into()])).unwrap();
	let p = renderer.host().document().children(target.container())[0];
	let text = renderer.host().document().children(p)[0];

	let xml = renderer.render(target, Element::new("p").children(vec![Node::text("world"), Element::new("br").into()])).unwrap();

	assert_eq!(xml, "<p>world<br/></p>");
	assert_eq!(renderer.host().document().children(p)[0], text);
	assert_eq!(renderer.host().document().node_value(text), Some("world"));
}

#[test]
fn different_tag_replaces_node() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	renderer.render(target, Element::new("foo")).unwrap();
	let foo = renderer.host().document().children(target.container())[0];

	let xml = renderer.render(target, Element::new("bar")).unwrap();

	assert_eq!(xml, "<bar/>");
	assert!(!renderer.host().document().contains(foo));
}

#[test]
fn surplus_children_are_removed_and_appended() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let list = |items: &[&str]| Element::new("ul").children(items.iter().map(|&item| Element::new("li").children(item).into()).collect::<Vec<Node>>());

	assert_eq!(renderer.render(target, list(&["a", "b", "c"])).unwrap(), "<ul><li>a</li><li>b</li><li>c</li></ul>");
	assert_eq!(renderer.render(target, list(&["a"])).unwrap(), "<ul><li>a</li></ul>");
	assert_eq!(renderer.render(target, list(&["x", "y"])).unwrap(), "<ul><li>x</li><li>y</li></ul>");
}

#[test]
fn switching_between_text_content_and_child_nodes() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	assert_eq!(renderer.render(target, Element::new("foo").children("text")).unwrap(), "<foo>text</foo>");
	assert_eq!(renderer.render(target, Element::new("foo").children(Element::new("bar"))).unwrap(), "<foo><bar/></foo>");
	assert_eq!(renderer.render(target, Element::new("foo").children(7)).unwrap(), "<foo>7</foo>");
	assert_eq!(renderer.render(target, Element::new("foo")).unwrap(), "<foo/>");
}

#[test]
fn numbers_are_written_without_fraction_when_integral() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let xml = renderer.render(target, Element::new("n").with("a", 1.5).with("b", 2.0).children(42)).unwrap();

	assert_eq!(xml, r#"<n a="1.5" b="2">42</n>"#);
}

#[test]
fn class_name_is_aliased() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	assert_eq!(renderer.render(target, Element::new("foo").with("className", "x")).unwrap(), r#"<foo class="x"/>"#);
	assert_eq!(renderer.render(target, Element::new("foo").with("className", "y")).unwrap(), r#"<foo class="y"/>"#);
	assert_eq!(renderer.render(target, Element::new("foo")).unwrap(), "<foo/>");
}

#[test]
fn html_for_is_aliased() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	assert_eq!(renderer.render(target, Element::new("label").with("htmlFor", "x")).unwrap(), r#"<label for="x"/>"#);
	assert_eq!(renderer.render(target, Element::new("label").with("htmlFor", "y")).unwrap(), r#"<label for="y"/>"#);
	assert_eq!(renderer.render(target, Element::new("label")).unwrap(), "<label/>");
}

#[test]
fn textarea_children_are_text_content() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	assert_eq!(renderer.render(target, Element::new("textarea").children("hi")).unwrap(), "<textarea>hi</textarea>");
	assert_eq!(renderer.render(target, Element::new("textarea").children("bye")).unwrap(), "<textarea>bye</textarea>");

	let other = renderer.create_target("root");
	let xml = renderer
		.render(other, Element::new("textarea").children(vec![Node::text("hi"), Element::new("b").into()]))
		.unwrap();
	assert_eq!(xml, "<textarea/>");
}

#[test]
fn replacement_keeps_its_position() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let p = |tags: &[&str]| Element::new("p").children(tags.iter().map(|&tag| Element::new(tag).into()).collect::<Vec<Node>>());
	renderer.render(target, p(&["a", "b", "c"])).unwrap();
	let document = renderer.host().document();
	let paragraph = document.children(target.container())[0];
	let (a, b, c) = match *document.children(paragraph) {
		[a, b, c] => (a, b, c),
		ref other => panic!("unexpected children {:?}", other),
	};

	let xml = renderer.render(target, p(&["a", "x", "c"])).unwrap();

	assert_eq!(xml, "<p><a/><x/><c/></p>");
	let document = renderer.host().document();
	let children = document.children(paragraph);
	assert_eq!((children[0], children[2]), (a, c));
	assert!(!document.contains(b));
}

#[test]
fn markup_is_escaped() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let xml = renderer.render(target, Element::new("foo").with("q", r#"a"b<c&"#).children("<&>")).unwrap();

	assert_eq!(xml, r#"<foo q="a&quot;b&lt;c&amp;">&lt;&amp;&gt;</foo>"#);
}

#[test]
fn invalid_tag_name_is_rejected() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let error = renderer.render(target, Element::new("a b")).unwrap_err();

	assert_eq!(error, Error::InvalidName { name: "a b".to_owned() });
	assert_eq!(error.to_string(), r#""a b" is not a valid XML name!"#);
	assert_eq!(renderer.markup(target), "");
	assert_eq!(renderer.host().document().len(), 1);
}

#[test]
fn invalid_attribute_name_is_rejected() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let injected = r#"x="1" evil"#;
	assert_eq!(
		renderer.render(target, Element::new("a").with(injected, "v")),
		Err(Error::InvalidName { name: injected.to_owned() })
	);
	assert_eq!(renderer.markup(target), "");

	renderer.render(target, Element::new("a")).unwrap();
	assert_eq!(
		renderer.render(target, Element::new("a").with("bad name", "v")),
		Err(Error::InvalidName { name: "bad name".to_owned() })
	);
	assert_eq!(renderer.markup(target), "<a/>");
}

#[test]
fn qualified_and_punctuated_names_are_accepted() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let xml = renderer.render(target, Element::new("svg:rect").with("data-x.y", 1).with("xml:lang", "de")).unwrap();

	assert_eq!(xml, r#"<svg:rect data-x.y="1" xml:lang="de"/>"#);
}

#[test]
fn auto_focus_is_applied_after_mounting() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let xml = renderer
		.render(
			target,
			Element::new("form").children(vec![Node::from(Element::new("div").with("autoFocus", true)), Element::new("input").with("autoFocus", true).into()]),
		)
		.unwrap();

	assert_eq!(xml, "<form><div/><input/></form>");
	let document = renderer.host().document();
	let form = document.children(target.container())[0];
	let input = document.children(form)[1];
	assert_eq!(document.focused(), Some(input));
	assert_eq!(document.parent(input), Some(form));
}

#[test]
fn root_is_cached_per_target() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");
	let other = renderer.create_target("root");

	// Pre-existing content is cleared when the root is created.
	let container = target.container();
	let stray = renderer.host_mut().document_mut().create_element("stray");
	renderer.host_mut().document_mut().append_child(container, stray);
	assert!(!renderer.has_root(target));

	assert_eq!(renderer.render(target, Element::new("foo")).unwrap(), "<foo/>");
	assert!(renderer.has_root(target));
	assert!(!renderer.has_root(other));

	// ...but never on later updates.
	let late = renderer.host_mut().document_mut().create_element("late");
	renderer.host_mut().document_mut().append_child(container, late);
	assert_eq!(renderer.render(target, Element::new("foo")).unwrap(), "<foo/><late/>");

	assert_eq!(renderer.render(other, Element::new("bar")).unwrap(), "<bar/>");
	assert_eq!(renderer.markup(target), "<foo/><late/>");
}

#[test]
fn unknown_target() {
	log_::init();
	let mut first = Renderer::new();
	let mut second = Renderer::new();
	first.create_target("root");
	second.create_target("root");
	let foreign = second.create_target("root");

	assert_eq!(first.render(foreign, Element::new("foo")), Err(Error::UnknownTarget));
}

#[test]
fn unmount_removes_everything() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	renderer.render(target, Element::new("foo").children(Element::new("bar"))).unwrap();
	assert!(renderer.unmount(target).unwrap());

	assert_eq!(renderer.markup(target), "");
	assert!(!renderer.has_root(target));
	assert_eq!(renderer.host().document().len(), 1);
	assert!(!renderer.unmount(target).unwrap());
}

#[test]
fn destroyed_target_is_released() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	renderer.render(target, Element::new("foo").children(Element::new("bar"))).unwrap();
	renderer.destroy_target(target).unwrap();

	assert!(renderer.host().document().is_empty());
	assert_eq!(renderer.render(target, Element::new("foo")), Err(Error::UnknownTarget));
	assert_eq!(renderer.destroy_target(target), Err(Error::UnknownTarget));
}

#[test]
fn completion_callback_runs_once_per_render() {
	log_::init();
	let mut renderer = Renderer::new();
	let target = renderer.create_target("root");

	let completed = Rc::new(Cell::new(0));
	let counter = Rc::clone(&completed);
	renderer.render_with_callback(target, Element::new("foo"), move || counter.set(counter.get() + 1)).unwrap();

	assert_eq!(completed.get(), 1);
}

#[test]
fn batched_mode_waits_for_flush() {
	log_::init();
	let mut renderer = Renderer::with_host(
		XmlHost::new(),
		Config {
			mode: SchedulingMode::Batched,
			..Config::default()
		},
	);
	let target = renderer.create_target("root");

	let completed = Rc::new(Cell::new(0));
	let counter = Rc::clone(&completed);
	assert_eq!(renderer.render_with_callback(target, Element::new("foo"), move || counter.set(counter.get() + 1)).unwrap(), "");
	assert_eq!(renderer.render(target, Element::new("bar")).unwrap(), "");
	assert_eq!(renderer.pending(), 2);
	assert_eq!(completed.get(), 0);

	renderer.flush().unwrap();

	assert_eq!(renderer.pending(), 0);
	assert_eq!(completed.get(), 1);
	assert_eq!(renderer.markup(target), "<bar/>");
}

#[test]
fn depth_limit_skips_deeper_content() {
	log_::init();
	let mut renderer = Renderer::with_host(XmlHost::new(), Config { depth_limit: 2, ..Config::default() });
	let target = renderer.create_target("root");

	let xml = renderer
		.render(target, Element::new("a").children(Element::new("b").children(Element::new("c"))))
		.unwrap();

	assert_eq!(xml, "<a><b/></a>");
}

#[test]
fn traced_host_renders_the_same() {
	log_::init();
	let mut renderer = Renderer::with_host(Traced::new(XmlHost::new()), Config::default());
	let target = renderer.create_target("root");

	renderer.render(target, Element::new("foo").with("a", "1").children("x")).unwrap();
	let xml = renderer.render(target, Element::new("foo").with("a", "2").children("y")).unwrap();

	assert_eq!(xml, r#"<foo a="2">y</foo>"#);
	assert_eq!(renderer.host().inner().document().len(), 3);
}
