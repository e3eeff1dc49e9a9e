//! Prompt assembly for the summarizer.

use crate::models::ContentItem;
use chrono::NaiveDate;

/// Render one item as a source block.
fn source_block(item: &ContentItem) -> String {
    format!(
        "[{}] {} {} ({})\n本文抜粋:\n{}\n",
        item.kind,
        item.iso_date(),
        item.title,
        item.link,
        item.content
    )
}

/// Build the summarization prompt: instructions first, then every interview
/// and press release as a source block.
pub fn build_prompt(interviews: &[ContentItem], press_releases: &[ContentItem], target_date: NaiveDate) -> String {
    let source_text = interviews
        .iter()
        .chain(press_releases)
        .map(source_block)
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "あなたは日本の行政情報に詳しいアシスタントです。
以下に、国土交通省の大臣記者会見と報道発表資料のテキストがあります。

これらを読み、**日本語**で次のようなMarkdown要約を作成してください。

- 全体の冒頭に「本日の国土交通省 大臣会見・報道発表サマリー（{target_date}時点）」というタイトル。
- セクションごとに1行の水平線（---）で区切る。
- セクション1: ①大臣記者会見の要点
  - 箇条書きで 3〜8 行程度
  - 政策的に重要そうなポイントは太字で強調
- セクション2: ②報道発表資料の要点
  - リスト形式で「・タイトル（所管局）: 本文の要約」のように短く整理
  - タイトルは20文字以内に要約し、太字で強調
- セクション3: ③業務・投資・研究のインプリケーション
  - 交通計画・都市計画・インフラ投資などの観点から、
    気づき・考察・チェックした方が良さそうな点を2〜4行でコメント

出力は**完全なMarkdownのみ**にしてください（余計な説明文は不要）。

===== 元テキスト =====
{source_text}"
    )
    .trim()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;

    fn item(kind: ContentKind, title: &str) -> ContentItem {
        ContentItem {
            kind,
            title: title.to_string(),
            link: format!("https://www.mlit.go.jp/{title}.html"),
            date: NaiveDate::from_ymd_opt(2025, 11, 18).unwrap(),
            content: format!("{title}の本文"),
        }
    }

    #[test]
    fn test_prompt_names_target_date() {
        let prompt = build_prompt(&[], &[], NaiveDate::from_ymd_opt(2025, 11, 18).unwrap());
        assert!(prompt.contains("大臣会見・報道発表サマリー（2025-11-18時点）"));
        assert!(prompt.ends_with("===== 元テキスト ====="));
    }

    #[test]
    fn test_interviews_come_before_press_releases() {
        let interviews = [item(ContentKind::Interview, "会見")];
        let press = [item(ContentKind::PressRelease, "発表")];
        let prompt = build_prompt(&interviews, &press, NaiveDate::from_ymd_opt(2025, 11, 18).unwrap());

        let interview_at = prompt
            .find("[大臣会見] 2025-11-18 会見 (https://www.mlit.go.jp/会見.html)\n本文抜粋:\n会見の本文")
            .unwrap();
        let press_at = prompt.find("[報道発表] 2025-11-18 発表").unwrap();
        assert!(interview_at < press_at);
    }
}
