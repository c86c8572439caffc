//! Fixture page and configuration for the scripted walkthrough.

pub const TOP_LEVEL_KEY: &str = "urmston";

pub const PAGE_HTML: &str = r#"<div class="site-wrapper">
<header class="masthead">
  <h1 data-thingy-path="settings heading">Will Urmston</h1>
  <h2 data-thingy-path="settings subheading">Product design and front-end build</h2>
</header>
<ul class="list">
  <li>
    <a href="https://pasteapp.com/" data-thingy-path="projects 0 link"><h3 data-thingy-path="projects 0 heading">Paste by WeTransfer</h3></a>
    <div><em data-thingy-path="projects 0 subheading">UI and interaction design</em></div>
    <p data-thingy-path="projects 0 description">Designing the clipboard manager for Mac and iOS.</p>
  </li>
  <li>
    <a href="https://example.com/atlas" data-thingy-path="projects 1 link"><h3 data-thingy-path="projects 1 heading">Atlas</h3></a>
    <div><em data-thingy-path="projects 1 subheading">Front-end build</em></div>
    <p data-thingy-path="projects 1 description">A mapping tool for field researchers.</p>
  </li>
</ul>
<section class="card">
  <div class="card-img"><img src="https://placehold.it/400x300" alt="Placeholder" data-thingy-path="card image"></div>
  <h3 class="title" data-thingy-path="card title">Flexible pattern</h3>
</section>
</div>"#;

pub const EDITOR_CONFIG: &str = r#"{
  "appendToolbarTo": ".site-wrapper",
  "backends": ["localStorage"],
  "localStorageBackend": { "topLevelKey": "urmston" },
  "tools": {
    "h1,h2,h3": [
      { "text": "B", "command": "bold", "tooltip": "Bold" },
      { "text": "S", "surroundsWith": { "element": "s" }, "tooltip": "Strike through" }
    ]
  },
  "imageLibrary": [
    { "src": "https://placehold.it/400x300", "srcset": "", "title": "Grey", "alt": "Grey placeholder" },
    { "src": "https://placehold.it/400x300/ff0000", "srcset": "https://placehold.it/800x600/ff0000 2x", "title": "Red", "alt": "Red placeholder" }
  ]
}"#;

pub const REGIONS: &str = r#"[
  { "selector": ".masthead", "nested": ["h1", "h2"], "disallowDefaultEnter": true },
  {
    "selector": ".list li",
    "nested": ["a", "a h3", "div em", "p"],
    "cloneOnCtrlEnter": true,
    "disallowDefaultEnter": true
  },
  { "selector": ".card", "nested": [".card-img img", "h3.title"] }
]"#;

/// What the site shipped with before anyone edited it.
pub const DEFAULT_DATA: &str = r#"{
  "settings": { "heading": "Will Urmston", "subheading": "Product design and front-end build" },
  "projects": [
    { "heading": "Paste by WeTransfer", "link": { "href": "https://pasteapp.com/" } },
    { "heading": "Atlas", "link": { "href": "https://example.com/atlas" } }
  ]
}"#;
