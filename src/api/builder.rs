//! Request parameters and the media container builder

use serde::Serialize;
use serde_json::Value;

use crate::models::{
    GifAttachment, MediaType, PollAttachment, ReplyControl, TextAttachment, TextEntity,
};

/// Ordered, insertion-stable key/value pairs sent as query or form fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Empty set
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Set `key`, replacing an earlier value in place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Set `key` unless `value` is empty
    pub fn set_non_empty(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.set(key, value);
        }
    }

    /// Append without replacing
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in insertion order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Drop every value for `key`
    pub fn remove(&mut self, key: &str) {
        self.0.retain(|(k, _)| k != key);
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no pairs
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys in insertion order
    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Borrow the raw pairs
    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }

    /// Take the raw pairs
    pub fn into_vec(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Render a loosely typed value as a parameter string
///
/// Strings pass through and integers render in base 10. Everything else
/// (floats, booleans, null, arrays, objects) renders as an empty string and
/// is therefore dropped by the builder.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        _ => String::new(),
    }
}

/// Fluent builder for media container creation parameters
///
/// Setters ignore empty input, booleans are only emitted when true, and
/// nested attachments are embedded as compact JSON strings. [`build`] takes
/// `&self` and has no side effects.
///
/// [`build`]: ContainerBuilder::build
#[derive(Debug, Clone, Default)]
pub struct ContainerBuilder {
    params: Params,
    children: Vec<String>,
    indexed_children: bool,
}

impl ContainerBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self::default()
    }

    fn string(mut self, key: &str, value: &str) -> Self {
        self.params.set_non_empty(key, value);
        self
    }

    fn flag(mut self, key: &str, value: bool) -> Self {
        if value {
            self.params.set(key, "true");
        }
        self
    }

    fn json<T: Serialize>(mut self, key: &str, value: Option<&T>) -> Self {
        let Some(value) = value else {
            return self;
        };
        match serde_json::to_string(value) {
            Ok(encoded) => self.params.set(key, encoded),
            Err(e) => tracing::warn!(field = key, error = %e, "Dropping unserializable field"),
        }
        self
    }

    /// Set an arbitrary field from a loosely typed value
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.set_non_empty(key, value_to_string(&value.into()));
        self
    }

    /// `media_type`
    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.params.set("media_type", media_type.as_str());
        self
    }

    /// `text`
    pub fn text(self, text: &str) -> Self {
        self.string("text", text)
    }

    /// `image_url`
    pub fn image_url(self, url: &str) -> Self {
        self.string("image_url", url)
    }

    /// `video_url`
    pub fn video_url(self, url: &str) -> Self {
        self.string("video_url", url)
    }

    /// `alt_text`
    pub fn alt_text(self, alt_text: &str) -> Self {
        self.string("alt_text", alt_text)
    }

    /// `link_attachment`
    pub fn link_attachment(self, url: &str) -> Self {
        self.string("link_attachment", url)
    }

    /// `reply_to_id`
    pub fn reply_to(self, post_id: &str) -> Self {
        self.string("reply_to_id", post_id)
    }

    /// `quote_post_id`
    pub fn quote_post_id(self, post_id: &str) -> Self {
        self.string("quote_post_id", post_id)
    }

    /// `reply_control`
    pub fn reply_control(self, control: Option<ReplyControl>) -> Self {
        match control {
            Some(control) => self.string("reply_control", control.as_str()),
            None => self,
        }
    }

    /// `topic_tag`
    pub fn topic_tag(self, tag: &str) -> Self {
        self.string("topic_tag", tag)
    }

    /// `location_id`
    pub fn location_id(self, location_id: &str) -> Self {
        self.string("location_id", location_id)
    }

    /// `allowlisted_country_codes`, comma-joined
    pub fn allowlisted_country_codes(self, codes: &[String]) -> Self {
        let joined = codes
            .iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(",");
        self.string("allowlisted_country_codes", &joined)
    }

    /// `is_carousel_item`
    pub fn is_carousel_item(self, value: bool) -> Self {
        self.flag("is_carousel_item", value)
    }

    /// `auto_publish_text`
    pub fn auto_publish_text(self, value: bool) -> Self {
        self.flag("auto_publish_text", value)
    }

    /// `is_ghost_post`
    pub fn is_ghost_post(self, value: bool) -> Self {
        self.flag("is_ghost_post", value)
    }

    /// `is_spoiler_media`
    pub fn is_spoiler_media(self, value: bool) -> Self {
        self.flag("is_spoiler_media", value)
    }

    /// `poll_attachment` as JSON
    pub fn poll_attachment(self, poll: Option<&PollAttachment>) -> Self {
        self.json("poll_attachment", poll)
    }

    /// `gif_attachment` as JSON
    pub fn gif_attachment(self, gif: Option<&GifAttachment>) -> Self {
        self.json("gif_attachment", gif)
    }

    /// `text_attachment` as JSON
    pub fn text_attachment(self, attachment: Option<&TextAttachment>) -> Self {
        self.json("text_attachment", attachment)
    }

    /// `text_entities` as a JSON array
    pub fn text_entities(self, entities: &[TextEntity]) -> Self {
        if entities.is_empty() {
            return self;
        }
        self.json("text_entities", Some(&entities))
    }

    /// Append one child container
    pub fn add_child(mut self, container_id: &str) -> Self {
        if !container_id.is_empty() {
            self.children.push(container_id.to_string());
        }
        self
    }

    /// Replace the children and expose them as `children[i]` too
    pub fn children(mut self, container_ids: &[String]) -> Self {
        self.children = container_ids
            .iter()
            .filter(|id| !id.is_empty())
            .cloned()
            .collect();
        self.indexed_children = true;
        self
    }

    /// Snapshot of the accumulated parameters
    ///
    /// Children go out as one repeated `children` key per container.
    pub fn build(&self) -> Params {
        let mut params = self.params.clone();
        if !self.children.is_empty() {
            params.remove("children");
            for child in &self.children {
                params.push("children", child.clone());
            }
            if self.indexed_children {
                for (i, child) in self.children.iter().enumerate() {
                    params.set(format!("children[{i}]"), child.clone());
                }
            }
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_inputs_never_emit_fields() {
        let params = ContainerBuilder::new()
            .text("")
            .image_url("")
            .video_url("")
            .alt_text("")
            .link_attachment("")
            .reply_to("")
            .quote_post_id("")
            .reply_control(None)
            .topic_tag("")
            .location_id("")
            .allowlisted_country_codes(&[])
            .is_carousel_item(false)
            .auto_publish_text(false)
            .is_ghost_post(false)
            .is_spoiler_media(false)
            .poll_attachment(None)
            .gif_attachment(None)
            .text_attachment(None)
            .text_entities(&[])
            .add_child("")
            .build();
        assert!(params.is_empty(), "unexpected keys: {:?}", params.keys());
    }

    #[test]
    fn test_empty_input_does_not_clobber_earlier_value() {
        let params = ContainerBuilder::new().text("hello").text("").build();
        assert_eq!(params.get("text"), Some("hello"));
    }

    #[test]
    fn test_insertion_order_is_stable() {
        let params = ContainerBuilder::new()
            .media_type(MediaType::Text)
            .text("hello")
            .topic_tag("rust")
            .text("hello again")
            .build();
        assert_eq!(params.keys(), vec!["media_type", "text", "topic_tag"]);
        assert_eq!(params.get("text"), Some("hello again"));
    }

    #[test]
    fn test_booleans_only_when_true() {
        let params = ContainerBuilder::new()
            .is_carousel_item(true)
            .is_ghost_post(true)
            .build();
        assert_eq!(params.get("is_carousel_item"), Some("true"));
        assert_eq!(params.get("is_ghost_post"), Some("true"));
        assert!(!params.contains("auto_publish_text"));
    }

    #[test]
    fn test_attachments_are_json() {
        let poll = PollAttachment {
            option_a: "yes".into(),
            option_b: "no".into(),
            ..Default::default()
        };
        let entities = [TextEntity {
            entity_type: "SPOILER".into(),
            offset: 0,
            length: 5,
        }];
        let params = ContainerBuilder::new()
            .poll_attachment(Some(&poll))
            .gif_attachment(Some(&GifAttachment::tenor("g1")))
            .text_entities(&entities)
            .build();

        assert_eq!(
            params.get("poll_attachment"),
            Some(r#"{"option_a":"yes","option_b":"no"}"#)
        );
        assert_eq!(
            params.get("gif_attachment"),
            Some(r#"{"gif_id":"g1","provider":"TENOR"}"#)
        );
        assert_eq!(
            params.get("text_entities"),
            Some(r#"[{"entity_type":"SPOILER","offset":0,"length":5}]"#)
        );
    }

    #[test]
    fn test_children_indexed() {
        let ids = vec!["c1".to_string(), "c2".to_string(), "c3".to_string()];
        let params = ContainerBuilder::new()
            .media_type(MediaType::Carousel)
            .children(&ids)
            .build();
        assert_eq!(params.get_all("children"), vec!["c1", "c2", "c3"]);
        assert_eq!(params.get("children[0]"), Some("c1"));
        assert_eq!(params.get("children[2]"), Some("c3"));
    }

    #[test]
    fn test_add_child_without_index() {
        let params = ContainerBuilder::new().add_child("a").add_child("b").build();
        assert_eq!(params.get_all("children"), vec!["a", "b"]);
        assert!(!params.contains("children[0]"));
    }

    #[test]
    fn test_spoiler_media_flag() {
        let on = ContainerBuilder::new().is_spoiler_media(true).build();
        assert_eq!(on.get("is_spoiler_media"), Some("true"));

        let off = ContainerBuilder::new().is_spoiler_media(false).build();
        assert!(!off.contains("is_spoiler_media"));
    }

    #[test]
    fn test_country_codes_joined() {
        let params = ContainerBuilder::new()
            .allowlisted_country_codes(&["US".into(), "CA".into()])
            .build();
        assert_eq!(params.get("allowlisted_country_codes"), Some("US,CA"));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("hello")), "hello");
        assert_eq!(value_to_string(&json!(0)), "0");
        assert_eq!(value_to_string(&json!(123)), "123");
        assert_eq!(value_to_string(&json!(-456)), "-456");
        assert_eq!(value_to_string(&json!(1_000_000)), "1000000");
        assert_eq!(value_to_string(&json!(2.5)), "");
        assert_eq!(value_to_string(&Value::Null), "");
        assert_eq!(value_to_string(&json!(true)), "");
    }

    #[test]
    fn test_param_drops_unrenderable_values() {
        let params = ContainerBuilder::new()
            .param("limit", 25)
            .param("ratio", 0.5)
            .build();
        assert_eq!(params.get("limit"), Some("25"));
        assert!(!params.contains("ratio"));
    }

    #[test]
    fn test_build_is_pure() {
        let builder = ContainerBuilder::new().text("a").children(&["x".into()]);
        assert_eq!(builder.build(), builder.build());
    }

    #[test]
    fn test_params_multi_values() {
        let mut params = Params::new();
        params.push("field", "a");
        params.push("field", "b");
        assert_eq!(params.get("field"), Some("a"));
        assert_eq!(params.get_all("field"), vec!["a", "b"]);
        params.remove("field");
        assert!(params.is_empty());
    }
}
