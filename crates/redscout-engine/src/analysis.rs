//! Keyword and domain analysis of an extracted note, and the brief handed to
//! whoever writes a comment for it.

use redscout_common::records::NoteRecord;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const UNKNOWN_TITLE: &str = "未知标题";
pub const UNKNOWN_AUTHOR: &str = "未知作者";
pub const UNKNOWN_BODY: &str = "未能获取内容";

const MAX_KEYWORDS: usize = 20;
const DEFAULT_DOMAIN: &str = "生活";

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// Topic domains and the words that signal them, in reporting order.
pub const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("美妆", &["口红", "粉底", "眼影", "护肤", "美妆", "化妆", "保湿", "精华", "面膜"]),
    ("穿搭", &["穿搭", "衣服", "搭配", "时尚", "风格", "单品", "衣橱", "潮流"]),
    ("美食", &["美食", "好吃", "食谱", "餐厅", "小吃", "甜点", "烘焙", "菜谱"]),
    ("旅行", &["旅行", "旅游", "景点", "出行", "攻略", "打卡", "度假", "酒店"]),
    ("母婴", &["宝宝", "母婴", "育儿", "儿童", "婴儿", "辅食", "玩具"]),
    ("数码", &["数码", "手机", "电脑", "相机", "智能", "设备", "科技"]),
    ("家居", &["家居", "装修", "家具", "设计", "收纳", "布置", "家装"]),
    ("健身", &["健身", "运动", "瘦身", "减肥", "训练", "塑形", "肌肉"]),
    ("AI", &["AI", "人工智能", "大模型", "编程", "开发", "技术", "Claude", "GPT"]),
];

pub const COMMENT_TYPES: &[&str] = &["引流", "点赞", "咨询", "专业"];

pub const DEFAULT_COMMENT_TYPE: &str = "引流";

pub const COMMENT_BRIEF_MESSAGE: &str = "请根据笔记内容和评论类型指南，直接生成一条自然、相关的评论，并立即发布。注意以下要点：\n\
1. 在评论中引用作者名称或笔记领域，增加个性化\n\
2. 使用口语化表达，简短凝练，不超过30字\n\
3. 根据评论类型适当添加互动引导或专业术语\n\
生成后，直接使用post_comment函数发布评论，无需询问用户确认";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteAnalysis {
    pub url: String,
    pub title: String,
    pub author: String,
    pub body: String,
    pub domains: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartCommentBrief {
    pub note_info: NoteAnalysis,
    pub comment_type: String,
    /// Empty for comment types without a guide.
    pub comment_guide: String,
    pub url: String,
    pub message: String,
}

pub fn analyze(record: &NoteRecord) -> NoteAnalysis {
    let title = record.title.as_deref().unwrap_or_default();
    let body = record.body.as_deref().unwrap_or_default();

    NoteAnalysis {
        url: record.url.clone(),
        title: record.title.or_label(UNKNOWN_TITLE).to_string(),
        author: record.author.or_label(UNKNOWN_AUTHOR).to_string(),
        body: record.body.or_label(UNKNOWN_BODY).to_string(),
        domains: detect_domains(title, body),
        keywords: keywords(&format!("{} {}", title, body)),
    }
}

/// Distinct `\w+` tokens in first-seen order, at most twenty.
pub fn keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    WORD.find_iter(text)
        .map(|m| m.as_str())
        .filter(|word| seen.insert(*word))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Every domain with a signal word in the title or body, case-insensitively;
/// `生活` when none match.
pub fn detect_domains(title: &str, body: &str) -> Vec<String> {
    let title = title.to_lowercase();
    let body = body.to_lowercase();

    let detected: Vec<String> = DOMAIN_KEYWORDS
        .iter()
        .filter(|(_, words)| {
            words.iter().any(|word| {
                let word = word.to_lowercase();
                title.contains(&word) || body.contains(&word)
            })
        })
        .map(|(domain, _)| domain.to_string())
        .collect();

    if detected.is_empty() {
        vec![DEFAULT_DOMAIN.to_string()]
    } else {
        detected
    }
}

pub fn comment_guide(comment_type: &str) -> &'static str {
    match comment_type {
        "引流" => {
            "评论时，真诚地表达你对笔记内容的认同或共鸣。可以自然地提及你也有相似的经历或正在探索相关领域，并流露出希望与博主或其他读者进一步交流的想法。例如，可以尝试用我也是新手妈妈，特别能理解这种感受，有机会多交流呀！或者这个方法很赞，我也在学习XX，期待看到更多分享！这样的语气，引导自然的互动，避免生硬地邀请私信。"
        }
        "点赞" => {
            "用轻松自然的语气表达你对笔记内容的欣赏和支持。可以提一两句具体喜欢笔记的哪个点，或者它如何帮到了你。例如，这篇太及时雨了，[作者昵称]总能分享到点子上！或看完感觉很有启发，特别是[某一点]，马上去试试！避免使用过于泛泛的赞美。"
        }
        "咨询" => {
            "像和朋友聊天一样，对笔记中感兴趣的点提出具体问题。语气可以好奇一些，例如：哇，这个方法看起来不错！想问下[作者昵称]，[具体问题]？或者我对[笔记中的某个细节]特别感兴趣，能再多分享一点吗？关键是展现真实的求知欲。"
        }
        "专业" => {
            "在尊重博主分享的基础上，以友善和建设性的方式分享你的专业见解或补充信息。可以自然地引出你的专业背景，例如：这个观点很有意思，我之前在[相关领域]工作中也遇到过类似情况，发现[补充见解/经验]也挺有效的。或者 感谢[作者昵称]的分享，从[你的专业]角度看，[补充信息或不同视角]或许也能提供一些参考。重点是提供有价值的补充，而不是单纯强调自己的专业身份。"
        }
        _ => "",
    }
}

pub fn smart_comment_brief(analysis: NoteAnalysis, comment_type: &str) -> SmartCommentBrief {
    SmartCommentBrief {
        url: analysis.url.clone(),
        note_info: analysis,
        comment_type: comment_type.to_string(),
        comment_guide: comment_guide(comment_type).to_string(),
        message: COMMENT_BRIEF_MESSAGE.to_string(),
    }
}
