//! Workshop HTML fixtures and wiremock mounting helpers.

use workshop_curator::RawItem;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Collection id used by the mounted collection page.
pub const COLLECTION_ID: &str = "2488452435";

pub fn raw(id: &str, title: &str) -> RawItem {
    let mut item = RawItem::placeholder(id);
    item.title = title.to_string();
    item.author = format!("author-{id}");
    item.workshop_link = format!("https://steamcommunity.com/sharedfiles/filedetails/?id={id}");
    item
}

/// One `collectionItem` block as rendered by the collection page.
pub fn collection_block(base: &str, id: &str, title: &str) -> String {
    format!(
        r#"<div class="collectionItem" id="sharedfile_{id}">
  <div class="workshopItem">
    <a href="{base}/sharedfiles/filedetails/?id={id}">
      <div class="workshopItemPreviewHolder">
        <img class="workshopItemPreviewImage" src="{base}/images/{id}.png">
      </div>
    </a>
  </div>
  <div class="collectionItemDetails">
    <a href="{base}/sharedfiles/filedetails/?id={id}"><div class="workshopItemTitle">{title}</div></a>
    <div class="workshopItemAuthor">by Modder {id}</div>
    <div class="workshopItemShortDesc">Short text for {title}</div>
  </div>
</div>"#
    )
}

pub fn collection_page(base: &str, items: &[(&str, &str)]) -> String {
    let blocks: Vec<String> = items
        .iter()
        .map(|(id, title)| collection_block(base, id, title))
        .collect();
    format!(
        r#"<html><body><div class="collectionChildren">{}</div></body></html>"#,
        blocks.join("\n")
    )
}

pub fn item_page(base: &str, id: &str, title: &str) -> String {
    format!(
        r#"<html><body>
<div class="workshopItemTitle">{title}</div>
<div class="friendBlockContent">Modder {id}<br><span class="friendSmallText">Offline</span></div>
<div class="workshopItemDescription">Full description of {title}</div>
<img id="previewImageMain" class="workshopItemPreviewImageMain" src="{base}/images/{id}.png">
</body></html>"#
    )
}

pub fn collection_url(server: &MockServer) -> String {
    format!(
        "{}/sharedfiles/filedetails/?id={COLLECTION_ID}",
        server.uri()
    )
}

/// Mounts the collection page listing `items`.
pub async fn mount_collection(server: &MockServer, items: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/sharedfiles/filedetails/"))
        .and(query_param("id", COLLECTION_ID))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(collection_page(&server.uri(), items)),
        )
        .mount(server)
        .await;
}

/// Mounts an item page and its preview image.
pub async fn mount_item(server: &MockServer, id: &str, title: &str) {
    Mock::given(method("GET"))
        .and(path("/sharedfiles/filedetails/"))
        .and(query_param("id", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_page(&server.uri(), id, title)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/images/{id}.png")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("png-{id}").into_bytes()))
        .mount(server)
        .await;
}
