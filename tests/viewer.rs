//! Runs the generated viewer script against a minimal DOM.
//!
//! The stub models only what the viewer touches: elements looked up by id,
//! the page figures with their lazy images, class lists, listeners and
//! timers. Timers are queued and only fire on `flushTimers()`.

use boa_engine::{Context, JsValue, Source};
use pdf_flipbook::{PageFormat, PageNaming, PaddingPolicy, ViewerOptions, ViewerTemplater};

const DOM_STUB: &str = r#"
var listeners = {};
var timers = [];

function makeClassList() {
    var set = {};
    return {
        add: function () {
            for (var i = 0; i < arguments.length; i++) { set[arguments[i]] = true; }
        },
        remove: function (name) { delete set[name]; },
        toggle: function (name, on) { if (on) { set[name] = true; } else { delete set[name]; } },
        contains: function (name) { return set[name] === true; },
        names: function () { return Object.keys(set); }
    };
}

function makeElement() {
    return {
        classList: makeClassList(),
        style: {},
        textContent: '',
        disabled: false,
        handlers: {},
        children: [],
        img: null,
        addEventListener: function (type, fn) { this.handlers[type] = fn; },
        querySelector: function () { return this.img; },
        querySelectorAll: function () { return this.children; }
    };
}

var pages = [];
for (var i = 0; i < PAGE_COUNT; i++) {
    var figure = makeElement();
    figure.img = { loading: 'lazy' };
    pages.push(figure);
}
var root = makeElement();
root.children = pages;

var elements = {
    'flipbook': root,
    'prev-btn': makeElement(),
    'next-btn': makeElement(),
    'current-page': makeElement(),
    'total-pages': makeElement(),
    'progress-fill': makeElement()
};

var window = {
    setTimeout: function (fn) { timers.push(fn); return timers.length; },
    clearTimeout: function () {}
};

var document = {
    getElementById: function (id) { return elements[id] || null; },
    addEventListener: function (type, fn) { listeners[type] = fn; }
};

function flushTimers() {
    var pending = timers;
    timers = [];
    pending.forEach(function (fn) { fn(); });
}

function press(key) {
    listeners.keydown({ key: key, preventDefault: function () {} });
}

function swipe(fromX, toX) {
    root.handlers.touchstart({ changedTouches: [{ clientX: fromX }] });
    root.handlers.touchend({ changedTouches: [{ clientX: toX }] });
}

function activePages() {
    var active = [];
    pages.forEach(function (el, i) { if (el.classList.contains('active')) { active.push(i + 1); } });
    return active.join(',');
}

function flipClassesLeft() {
    return pages.some(function (el) {
        return el.classList.names().some(function (name) { return name.indexOf('flip-') === 0; });
    });
}
"#;

struct Viewer {
    context: Context,
}

impl Viewer {
    fn load(page_count: usize) -> Self {
        let naming =
            PageNaming::for_page_count(page_count, PageFormat::Jpeg, PaddingPolicy::AutoWiden)
                .unwrap();
        let bundle = ViewerTemplater::new()
            .unwrap()
            .render(page_count, &naming, &ViewerOptions::default())
            .unwrap();

        let mut viewer = Self {
            context: Context::default(),
        };
        viewer.run(&format!("var PAGE_COUNT = {page_count};\n{DOM_STUB}"));
        viewer.run(&bundle.script);
        viewer.run("listeners.DOMContentLoaded();");
        viewer
    }

    fn run(&mut self, code: &str) -> JsValue {
        self.context
            .eval(Source::from_bytes(code))
            .unwrap_or_else(|e| panic!("script failed: {e}\n{code}"))
    }

    fn number(&mut self, expr: &str) -> f64 {
        self.run(expr)
            .as_number()
            .unwrap_or_else(|| panic!("{expr} is not a number"))
    }

    fn flag(&mut self, expr: &str) -> bool {
        self.run(expr)
            .as_boolean()
            .unwrap_or_else(|| panic!("{expr} is not a boolean"))
    }

    fn text(&mut self, expr: &str) -> String {
        self.run(expr)
            .as_string()
            .unwrap_or_else(|| panic!("{expr} is not a string"))
            .to_std_string_escaped()
    }

    fn page(&mut self) -> f64 {
        self.number("window.flipbook.currentPage")
    }
}

#[test]
fn viewer_starts_on_first_page() {
    let mut viewer = Viewer::load(4);
    assert_eq!(viewer.page(), 1.0);
    assert_eq!(viewer.text("activePages()"), "1");
    assert_eq!(viewer.text("elements['current-page'].textContent"), "1");
    assert_eq!(viewer.text("elements['total-pages'].textContent"), "4");
    assert!(viewer.flag("elements['prev-btn'].disabled"));
    assert!(!viewer.flag("elements['next-btn'].disabled"));
    // the following page is fetched eagerly, the rest stay lazy
    assert_eq!(viewer.text("pages[1].img.loading"), "eager");
    assert_eq!(viewer.text("pages[2].img.loading"), "lazy");
}

#[test]
fn previous_on_first_page_stays_put() {
    let mut viewer = Viewer::load(3);
    viewer.run("window.flipbook.previous();");
    assert_eq!(viewer.page(), 1.0);
    assert!(!viewer.flag("window.flipbook.isFlipping"));
}

#[test]
fn next_on_last_page_stays_put() {
    let mut viewer = Viewer::load(3);
    viewer.run("window.flipbook.next(); window.flipbook.next();");
    assert_eq!(viewer.page(), 3.0);
    viewer.run("flushTimers(); window.flipbook.next();");
    assert_eq!(viewer.page(), 3.0);
    assert!(!viewer.flag("window.flipbook.isFlipping"));
    assert!(viewer.flag("elements['next-btn'].disabled"));
    assert!(!viewer.flag("elements['prev-btn'].disabled"));
}

#[test]
fn jump_to_clamps_into_range() {
    let mut viewer = Viewer::load(5);
    viewer.run("window.flipbook.jumpTo(10);");
    assert_eq!(viewer.page(), 5.0);
    viewer.run("window.flipbook.jumpTo(0);");
    assert_eq!(viewer.page(), 1.0);
    viewer.run("window.flipbook.jumpTo(3);");
    assert_eq!(viewer.page(), 3.0);
    viewer.run("window.flipbook.jumpTo(-7);");
    assert_eq!(viewer.page(), 1.0);
    viewer.run("window.flipbook.jumpTo('not a page');");
    assert_eq!(viewer.page(), 1.0);
}

#[test]
fn flip_settles_into_a_single_active_page() {
    let mut viewer = Viewer::load(4);
    viewer.run("window.flipbook.next();");
    assert_eq!(viewer.page(), 2.0);
    assert!(viewer.flag("window.flipbook.isFlipping"));
    assert!(viewer.flag("pages[0].classList.contains('flip-out-forward')"));
    assert!(viewer.flag("pages[1].classList.contains('flip-in-forward')"));

    viewer.run("flushTimers();");
    assert!(!viewer.flag("window.flipbook.isFlipping"));
    assert!(!viewer.flag("flipClassesLeft()"));
    assert_eq!(viewer.text("activePages()"), "2");
    assert_eq!(viewer.text("elements['progress-fill'].style.width"), "50%");
}

#[test]
fn rapid_flips_never_leave_two_pages_active() {
    let mut viewer = Viewer::load(6);
    viewer.run("window.flipbook.next(); window.flipbook.next(); window.flipbook.previous();");
    assert_eq!(viewer.page(), 2.0);
    viewer.run("flushTimers();");
    assert_eq!(viewer.text("activePages()"), "2");
    assert!(!viewer.flag("flipClassesLeft()"));
}

#[test]
fn keyboard_and_swipe_navigate() {
    let mut viewer = Viewer::load(5);
    viewer.run("press('ArrowRight'); press(' ');");
    assert_eq!(viewer.page(), 3.0);
    viewer.run("press('ArrowLeft');");
    assert_eq!(viewer.page(), 2.0);
    viewer.run("press('End');");
    assert_eq!(viewer.page(), 5.0);
    viewer.run("press('Home');");
    assert_eq!(viewer.page(), 1.0);

    viewer.run("swipe(200, 100);");
    assert_eq!(viewer.page(), 2.0);
    viewer.run("swipe(100, 130);");
    assert_eq!(viewer.page(), 2.0, "short swipes are ignored");
    viewer.run("swipe(100, 200);");
    assert_eq!(viewer.page(), 1.0);
}

#[test]
fn single_page_book_cannot_move() {
    let mut viewer = Viewer::load(1);
    viewer.run("window.flipbook.next(); window.flipbook.previous(); window.flipbook.jumpTo(9);");
    assert_eq!(viewer.page(), 1.0);
    assert!(viewer.flag("elements['prev-btn'].disabled"));
    assert!(viewer.flag("elements['next-btn'].disabled"));
    assert_eq!(viewer.text("elements['progress-fill'].style.width"), "100%");
}
