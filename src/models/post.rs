use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::post::{NewPostLog as DomainNewPostLog, PostLog as DomainPostLog};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::posts)]
pub struct PostLog {
    pub id: i32,
    pub item_id: String,
    pub post_text: String,
    pub hosted_image_url: Option<String>,
    pub publish_id: Option<String>,
    pub status: String,
    pub posted_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::posts)]
pub struct NewPostLog<'a> {
    pub item_id: &'a str,
    pub post_text: &'a str,
    pub hosted_image_url: Option<&'a str>,
    pub publish_id: Option<&'a str>,
    pub status: &'a str,
    pub posted_at: NaiveDateTime,
}

impl From<PostLog> for DomainPostLog {
    fn from(value: PostLog) -> Self {
        Self {
            id: value.id,
            item_id: value.item_id,
            post_text: value.post_text,
            hosted_image_url: value.hosted_image_url,
            publish_id: value.publish_id,
            status: value.status.as_str().into(),
            posted_at: value.posted_at,
        }
    }
}

impl<'a> From<&'a DomainNewPostLog> for NewPostLog<'a> {
    fn from(value: &'a DomainNewPostLog) -> Self {
        Self {
            item_id: value.item_id.as_str(),
            post_text: value.post_text.as_str(),
            hosted_image_url: value.hosted_image_url.as_deref(),
            publish_id: value.publish_id.as_deref(),
            status: value.status.into(),
            posted_at: value.posted_at,
        }
    }
}
