/*!
 * Tests for attribute decomposition and recomposition
 */

use polypress::markup::tags::tokenize;
use polypress::markup::{decompose, recompose, recompose_with_report};

const ARTICLE: &str = r#"<h1>Bitcoin Basics</h1><p class="x">Buy <b>BTC</b> now.</p>"#;

/// The worked example: skeleton, ledger and exact round trip
#[test]
fn test_decompose_withArticleExample_shouldProduceSkeletonAndLedger() {
    let (skeleton, ledger) = decompose(ARTICLE);

    assert_eq!(skeleton, "<h1>Bitcoin Basics</h1><p>Buy <b>BTC</b> now.</p>");

    let tuples: Vec<_> = ledger.iter().map(|r| r.as_tuple()).collect();
    assert_eq!(
        tuples,
        vec![
            (false, "h1", "", false),
            (true, "h1", "", false),
            (false, "p", r#"class="x""#, false),
            (false, "b", "", false),
            (true, "b", "", false),
            (true, "p", "", false),
        ]
    );

    assert_eq!(recompose(&skeleton, &ledger), ARTICLE);
}

#[test]
fn test_roundTrip_withVariedMarkup_shouldReproduceInput() {
    let samples = [
        "",
        "plain text only",
        r#"<div id="main" data-x="1"><img src="a.png" alt="A"/><br /><br/></div>"#,
        r#"<ul class="list"><li><a href="https://example.com?a=1&amp;b=2" target="_blank">x</a></li></ul>"#,
        "<p>1 &lt; 2 and 3 > 2</p><p\n  class=\"multi\"\n>wrapped</p>",
        "<!-- note --><p>after comment</p>",
        "<p>unicode ü 日本語 <em lang=\"ja\">語</em></p>",
    ];

    for html in samples {
        let (skeleton, ledger) = decompose(html);
        assert_eq!(recompose(&skeleton, &ledger), html, "round trip failed for {:?}", html);
    }
}

#[test]
fn test_ledger_length_shouldEqualTagCount() {
    let html = r#"<p a="1">x<br/>y<span>z</span></p><hr>"#;
    let (_, ledger) = decompose(html);
    let tag_count = tokenize(html)
        .iter()
        .filter(|t| matches!(t, polypress::markup::tags::Token::Tag(_)))
        .count();
    assert_eq!(ledger.len(), tag_count);
    assert_eq!(ledger.len(), 6);
}

#[test]
fn test_recompose_withTranslatedText_shouldRestoreAttributes() {
    let (_, ledger) = decompose(ARTICLE);
    let translated = "<h1>Les bases du Bitcoin</h1><p>Achetez <b>du BTC</b> maintenant.</p>";

    assert_eq!(
        recompose(translated, &ledger),
        r#"<h1>Les bases du Bitcoin</h1><p class="x">Achetez <b>du BTC</b> maintenant.</p>"#
    );
}

#[test]
fn test_recompose_withDroppedTags_shouldLeaveLaterTagsBare() {
    let (_, ledger) = decompose(r#"<p class="a"><b>x</b></p><p class="c">y</p>"#);

    let report = recompose_with_report("<p>x</p><p>y</p>", &ledger);

    assert_eq!(report.html, r#"<p class="a">x</p><p>y</p>"#);
    assert_eq!(report.restored, 1);
    assert_eq!(report.unmatched, 3);
    assert!(!report.is_aligned());
}

#[test]
fn test_recompose_withInsertedTag_shouldRealignOnNextMatch() {
    let (_, ledger) = decompose(r#"<p class="a">x</p><p class="c">y</p>"#);

    let report = recompose_with_report("<p>x<em>!</em></p><p>y</p>", &ledger);

    assert_eq!(report.html, r#"<p class="a">x<em>!</em></p><p class="c">y</p>"#);
    assert_eq!(report.unmatched, 2);
    assert_eq!(report.unconsumed, 0);
}

#[test]
fn test_recompose_withReorderedTags_shouldNotPanic() {
    let (_, ledger) = decompose(r#"<b id="1">a</b><i id="2">b</i>"#);

    let html = recompose("<i>b</i><b>a</b>", &ledger);

    // Only the leading <i>...</i> can't line up; the cursor catches up on <b>
    assert_eq!(html, r#"<i>b</i><b id="1">a</b>"#);
}

#[test]
fn test_recompose_withEmptyLedger_shouldPassThrough() {
    let (_, ledger) = decompose("no tags here");
    assert!(ledger.is_empty());
    assert_eq!(recompose("<p>new</p>", &ledger), "<p>new</p>");
}
