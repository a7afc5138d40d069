use crate::mailchimp::types::{Member, SegmentBatchRequest};
use std::fmt;
use std::str::FromStr;

/// Direction of a tag-segment batch update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMode {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tag mode {0:?} (expected \"add\" or \"remove\")")]
pub struct UnknownTagMode(pub String);

impl FromStr for TagMode {
    type Err = UnknownTagMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(TagMode::Add),
            "remove" => Ok(TagMode::Remove),
            other => Err(UnknownTagMode(other.to_string())),
        }
    }
}

impl fmt::Display for TagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TagMode::Add => "add",
            TagMode::Remove => "remove",
        })
    }
}

/// Batch body listing every member's address on the side given by `mode`, in member order.
pub fn batch_request(mode: TagMode, members: &[Member]) -> SegmentBatchRequest {
    let emails: Vec<String> = members.iter().map(|m| m.email_address.clone()).collect();
    match mode {
        TagMode::Add => SegmentBatchRequest {
            members_to_add: emails,
            members_to_remove: Vec::new(),
        },
        TagMode::Remove => SegmentBatchRequest {
            members_to_add: Vec::new(),
            members_to_remove: emails,
        },
    }
}
