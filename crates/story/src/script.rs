//! A scripted editing session: the same steps someone would take by hand
//! in the browser.

use anyhow::{Context as _, Result};
use thingy_core::ToolAction;
use thingy_dom::{NodeId, Rect, SelectorList, Selection};
use thingy_editor::EditorSession;
use tracing::info;

fn find(session: &EditorSession, selector: &str) -> Result<NodeId> {
    let document = session.document();
    let selector = SelectorList::parse(selector)?;
    document
        .query_selector(document.root(), &selector)
        .with_context(|| format!("no element matches {selector}"))
}

fn control(session: &EditorSession, caption: &str) -> Result<NodeId> {
    session
        .active_tools()
        .iter()
        .find(|active| active.resolved.tool.caption() == Some(caption))
        .map(|active| active.control)
        .with_context(|| format!("no tool captioned {caption:?} is active"))
}

fn image_picker(session: &EditorSession) -> Result<NodeId> {
    session
        .active_tools()
        .iter()
        .find(|active| matches!(active.resolved.tool.action, ToolAction::ImagePicker))
        .map(|active| active.control)
        .context("no image picker is active")
}

pub fn run(session: &mut EditorSession) -> Result<()> {
    retitle_first_project(session)?;
    relink_first_project(session)?;
    repeat_first_project(session)?;
    swap_card_image(session)?;
    drag_toolbar(session)?;
    Ok(())
}

fn retitle_first_project(session: &mut EditorSession) -> Result<()> {
    let heading = find(session, ".list li a h3")?;
    session.focus(heading)?;
    session.edit_text(heading, "Paste by WeTransfer, 2019 onwards")?;
    let breadcrumb = session
        .toolbar()
        .map(|toolbar| toolbar.breadcrumb(session.document()))
        .unwrap_or_default();
    info!(%breadcrumb, "retitled");

    let text = session
        .document()
        .first_child(heading)
        .context("heading has no text")?;
    session
        .document_mut()
        .set_selection(Some(Selection::within(text, 0, 5)));
    let bold = control(session, "B")?;
    session.click(bold)?;

    let tail = session
        .document()
        .children(heading)
        .last()
        .copied()
        .filter(|&n| session.document().is_text(n))
        .context("heading does not end in text")?;
    session
        .document_mut()
        .set_selection(Some(Selection::within(tail, 1, 3)));
    let strike = control(session, "S")?;
    session.click(strike)?;
    info!(heading = %session.document().inner_html(heading), "formatted heading");
    Ok(())
}

fn relink_first_project(session: &mut EditorSession) -> Result<()> {
    let link = find(session, ".list li a")?;
    session.focus(link)?;
    let href = control(session, "Link href")?;
    session.fill(href, "https://paste.app/")?;
    info!(href = ?session.document().attribute(link, "href"), "relinked");
    Ok(())
}

fn repeat_first_project(session: &mut EditorSession) -> Result<()> {
    let description = find(session, ".list li p")?;
    session.focus(description)?;
    let outcome = session.key_press(description, "Enter", true)?;
    let list = find(session, ".list")?;
    let items = SelectorList::parse("li")?;
    let count = session.document().query_selector_all(list, &items).len();
    info!(count, default_prevented = outcome.default_prevented, "repeated project");
    Ok(())
}

fn swap_card_image(session: &mut EditorSession) -> Result<()> {
    let image = find(session, ".card img")?;
    session.focus(image)?;
    let picker = image_picker(session)?;
    let red = session
        .document()
        .children(picker)
        .get(1)
        .copied()
        .context("image library has fewer than two entries")?;
    session.click(red)?;
    info!(src = ?session.document().attribute(image, "src"), "swapped card image");
    Ok(())
}

fn drag_toolbar(session: &mut EditorSession) -> Result<()> {
    let toolbar = session.toolbar().context("toolbar was never created")?;
    session
        .document_mut()
        .set_rect(toolbar.element, Rect::new(0., 0., 240., 160.));
    session.press(toolbar.handle, 10., 10.)?;
    session.move_pointer(410., 60.)?;
    session.release(410., 60.)?;
    info!(position = ?toolbar.position(session.document()), "moved toolbar");
    Ok(())
}
