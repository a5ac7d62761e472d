mod common;

use common::{FakeBackend, FakeElement, ROOT, service};
use redscout_engine::backend::Locator;
use redscout_engine::config::SiteConfig;
use redscout_engine::extraction::{self, CARD_LINK};
use redscout_engine::formatter;
use redscout_engine::records::FieldValue;

/// A result card with a link and, when given, a footer title.
fn add_card(backend: &FakeBackend, id: &str, title: Option<&str>) -> u64 {
    let card = backend.add(FakeElement::new(&["section.note-item"], ""));
    backend.add(
        FakeElement::new(&[CARD_LINK], "")
            .attr("href", &format!("/search_result/{}?xsec_token=t", id))
            .within(card),
    );
    if let Some(title) = title {
        backend.add(
            FakeElement::new(&["div.footer a.title span", "a.title span", "span"], title)
                .within(card),
        );
    }
    card
}

#[tokio::test(start_paused = true)]
async fn test_search_stops_at_limit() {
    let backend = FakeBackend::new();
    for i in 0..5 {
        add_card(&backend, &format!("note{}", i), Some(&format!("第{}篇笔记", i)));
    }
    let service = service(&backend);

    let hits = service.search_notes("咖啡", 2, false).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].url, format!("{}/search_result/note0?xsec_token=t", ROOT));
    assert_eq!(hits[0].title, FieldValue::Known("第0篇笔记".into()));
    assert_eq!(
        hits[1].display_url(),
        format!("{}/explore/note1?xsec_token=t", ROOT)
    );
    assert!(
        backend
            .navigations()
            .contains(&format!("{}/search_result?keyword=%E5%92%96%E5%95%A1", ROOT))
    );

    let text = formatter::format_search("咖啡", &hits, false);
    assert!(text.contains("2. 第1篇笔记\n   链接: https://www.xiaohongshu.com/explore/note1"));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_and_linkless_cards_are_skipped() {
    let mut backend = FakeBackend::new();
    add_card(&backend, "same", Some("第一张卡片"));
    add_card(&backend, "same", Some("重复的卡片"));
    backend.add(FakeElement::new(&["section.note-item"], "没有链接"));
    add_card(&backend, "other", Some("第三张卡片"));

    let hits = extraction::collect_hits(&mut backend, &SiteConfig::default(), 10)
        .await
        .unwrap();

    let titles: Vec<_> = hits.iter().map(|h| h.title.or_label("?")).collect();
    assert_eq!(titles, vec!["第一张卡片", "第三张卡片"]);
}

#[tokio::test(start_paused = true)]
async fn test_card_title_falls_back_to_descendant_text() {
    let mut backend = FakeBackend::new();
    let card = add_card(&backend, "bare", None);
    backend.page().elements[card as usize].descendant_texts =
        vec!["12".into(), "这是一段足够长的标题".into(), "短".into()];

    let hits = extraction::collect_hits(&mut backend, &SiteConfig::default(), 10)
        .await
        .unwrap();

    assert_eq!(hits[0].title.as_deref(), Some("这是一段足够长的标题"));
}

#[tokio::test(start_paused = true)]
async fn test_sort_by_latest_clicks_both_controls() {
    let backend = FakeBackend::new();
    let dropdown = backend.add(FakeElement::text("综合"));
    let newest = backend.add(FakeElement::text("最新"));
    add_card(&backend, "n1", Some("最新的一篇"));
    let service = service(&backend);

    let hits = service.search_notes("咖啡", 5, true).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(
        backend.mutations(),
        vec![common::Call::Click(dropdown), common::Call::Click(newest)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_sort_control_still_searches() {
    let backend = FakeBackend::new();
    add_card(&backend, "n1", Some("没有排序也能搜"));
    let service = service(&backend);

    let hits = service.search_notes("咖啡", 5, true).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(backend.queries_for(&Locator::text("最新")), 0);
}
