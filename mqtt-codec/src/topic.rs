// Copyright (c) Microsoft. All rights reserved.

//! Topic names and topic filters.
//!
//! Ref:
//! - 3.1.1: 4.7 Topic Names and Topic Filters
//! - 5.0:   4.7 Topic Names and Topic Filters, 4.8.2 Shared Subscriptions

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TopicError {
    #[error("topic is empty")]
    Empty,
    #[error("topic name contains a wildcard")]
    WildcardInTopicName,
    #[error("multi-level wildcard must occupy the last level on its own")]
    InvalidMultiLevelWildcard,
    #[error("single-level wildcard must occupy a level on its own")]
    InvalidSingleLevelWildcard,
    #[error("shared subscription needs a share name and a topic filter")]
    InvalidSharedSubscription,
}

const SHARED_SUBSCRIPTION_PREFIX: &str = "$share/";

fn is_wildcard(c: char) -> bool {
    c == '+' || c == '#'
}

/// The topic a PUBLISH or a will message is sent to. Must be non-empty and must not contain wildcards.
pub fn validate_topic_name(topic_name: &str) -> Result<(), TopicError> {
    if topic_name.is_empty() {
        return Err(TopicError::Empty);
    }

    if topic_name.contains(is_wildcard) {
        return Err(TopicError::WildcardInTopicName);
    }

    Ok(())
}

/// A subscription pattern. `#` may only be the entire last level, `+` may only be an entire level,
/// and `$share/{ShareName}/{filter}` needs both parts.
pub fn validate_topic_filter(topic_filter: &str) -> Result<(), TopicError> {
    if topic_filter.is_empty() {
        return Err(TopicError::Empty);
    }

    let topic_filter = match topic_filter.strip_prefix(SHARED_SUBSCRIPTION_PREFIX) {
        Some(shared) => {
            let (share_name, topic_filter) = shared
                .split_once('/')
                .ok_or(TopicError::InvalidSharedSubscription)?;
            if share_name.is_empty() || share_name.contains(is_wildcard) || topic_filter.is_empty()
            {
                return Err(TopicError::InvalidSharedSubscription);
            }
            topic_filter
        }
        None => topic_filter,
    };

    let mut levels = topic_filter.split('/').peekable();
    while let Some(level) = levels.next() {
        if level.contains('#') && (level != "#" || levels.peek().is_some()) {
            return Err(TopicError::InvalidMultiLevelWildcard);
        }

        if level.contains('+') && level != "+" {
            return Err(TopicError::InvalidSingleLevelWildcard);
        }
    }

    Ok(())
}
