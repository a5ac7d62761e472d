use crate::analysis::{
    NoteAnalysis, SmartCommentBrief, UNKNOWN_AUTHOR, UNKNOWN_BODY, UNKNOWN_TITLE,
};
use redscout_common::records::{
    ActionKind, ActionResult, CommentRecord, LoginOutcome, NoteRecord, SearchHit,
};

const UNKNOWN_TIME: &str = "未知";

pub fn format_login(outcome: LoginOutcome) -> String {
    match outcome {
        LoginOutcome::AlreadyLoggedIn => "已登录小红书账号".to_string(),
        LoginOutcome::Succeeded => "登录成功！".to_string(),
        LoginOutcome::TimedOut => {
            "登录等待超时。请重试或手动登录后再使用其他功能。".to_string()
        }
    }
}

pub fn format_search(keywords: &str, hits: &[SearchHit], sort_by_time: bool) -> String {
    if hits.is_empty() {
        return format!("未找到与\"{}\"相关的笔记", keywords);
    }

    let mut output = if sort_by_time {
        "按最新时间排序的搜索结果：\n\n".to_string()
    } else {
        "搜索结果：\n\n".to_string()
    };
    for (i, hit) in hits.iter().enumerate() {
        output.push_str(&format!(
            "{}. {}\n   链接: {}\n\n",
            i + 1,
            hit.title.or_label(UNKNOWN_TITLE),
            hit.display_url()
        ));
    }
    output
}

pub fn format_note(record: &NoteRecord) -> String {
    format!(
        "标题: {}\n作者: {}\n发布时间: {}\n链接: {}\n\n内容:\n{}",
        record.title.or_label(UNKNOWN_TITLE),
        record.author.or_label(UNKNOWN_AUTHOR),
        record.published_at.or_label(UNKNOWN_TIME),
        record.url,
        record.body.or_label(UNKNOWN_BODY),
    )
}

pub fn format_comments(comments: &[CommentRecord]) -> String {
    if comments.is_empty() {
        return "未找到任何评论，可能是帖子没有评论或评论区无法访问。".to_string();
    }

    let mut output = format!("共获取到 {} 条评论：\n\n", comments.len());
    for (i, comment) in comments.iter().enumerate() {
        output.push_str(&format!(
            "{}. {}（{}）: {}\n\n",
            i + 1,
            comment.username,
            comment.posted_at,
            comment.content
        ));
    }
    output
}

pub fn format_action(result: &ActionResult) -> String {
    if result.kind == ActionKind::Comment && result.succeeded && !result.verified {
        return format!("{}（未能在页面上确认，评论可能正在审核）", result.detail);
    }
    result.detail.clone()
}

pub fn format_analysis(analysis: &NoteAnalysis) -> String {
    format!(
        "链接: {}\n标题: {}\n作者: {}\n领域: {}\n关键词: {}\n\n内容:\n{}",
        analysis.url,
        analysis.title,
        analysis.author,
        analysis.domains.join("、"),
        analysis.keywords.join(", "),
        analysis.body
    )
}

pub fn format_brief(brief: &SmartCommentBrief) -> String {
    let mut output = format_analysis(&brief.note_info);
    output.push_str(&format!("\n\n评论类型: {}\n", brief.comment_type));
    if !brief.comment_guide.is_empty() {
        output.push_str(&format!("评论指南: {}\n", brief.comment_guide));
    }
    output.push('\n');
    output.push_str(&brief.message);
    output
}
