use newswire_core::{Comment, CommentSubmission, NewsServiceManager};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{CommentArgs, CommentsArgs, LimitArgs};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct CommentsResponseData {
    comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
struct CommentResponseData {
    comment: Comment,
}

pub async fn by_post(args: &CommentsArgs, manager: &NewsServiceManager) -> Result<Value, CliError> {
    let comments = manager.fetch_comments_by_post_id(args.post_id).await?;
    Ok(serde_json::to_value(CommentsResponseData { comments })?)
}

pub async fn recent(args: &LimitArgs, manager: &NewsServiceManager) -> Result<Value, CliError> {
    let comments = manager.fetch_recent_comments(args.limit).await?;
    Ok(serde_json::to_value(CommentsResponseData { comments })?)
}

pub async fn submit(args: &CommentArgs, manager: &NewsServiceManager) -> Result<Value, CliError> {
    let submission = CommentSubmission::new(
        args.post,
        args.name.as_str(),
        args.email.as_str(),
        args.content.as_str(),
        args.url.clone(),
    )?;
    let comment = manager.submit_comment(&submission).await?;
    Ok(serde_json::to_value(CommentResponseData { comment })?)
}
