use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Body of an APNS notification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApnsPayload {
    alert: Option<Value>,
    badge: Option<u32>,
    sound: Option<String>,
    category: Option<String>,
    thread_id: Option<String>,
    content_available: bool,
    mutable_content: bool,
    custom_data: Map<String, Value>,
}

impl ApnsPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set_alert(mut self, body: &str) -> Self {
        self.alert = Some(Value::String(body.to_owned()));
        self
    }

    #[must_use]
    pub fn set_alert_with_title(mut self, title: &str, body: &str) -> Self {
        self.alert = Some(json!({ "title": title, "body": body }));
        self
    }

    #[must_use]
    pub const fn set_badge(mut self, badge: u32) -> Self {
        self.badge = Some(badge);
        self
    }

    #[must_use]
    pub fn set_sound(mut self, sound: &str) -> Self {
        self.sound = Some(sound.to_owned());
        self
    }

    #[must_use]
    pub fn set_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    #[must_use]
    pub fn set_thread_id(mut self, thread_id: &str) -> Self {
        self.thread_id = Some(thread_id.to_owned());
        self
    }

    #[must_use]
    pub const fn set_content_available(mut self, available: bool) -> Self {
        self.content_available = available;
        self
    }

    #[must_use]
    pub const fn set_mutable_content(mut self, mutable: bool) -> Self {
        self.mutable_content = mutable;
        self
    }

    /// Adds an application key next to the `aps` dictionary.
    #[must_use]
    pub fn set_custom_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.custom_data.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut aps = Map::new();
        if let Some(alert) = &self.alert {
            aps.insert("alert".into(), alert.clone());
        }
        if let Some(badge) = self.badge {
            aps.insert("badge".into(), badge.into());
        }
        if let Some(sound) = &self.sound {
            aps.insert("sound".into(), sound.as_str().into());
        }
        if let Some(category) = &self.category {
            aps.insert("category".into(), category.as_str().into());
        }
        if let Some(thread_id) = &self.thread_id {
            aps.insert("thread-id".into(), thread_id.as_str().into());
        }
        if self.content_available {
            aps.insert("content-available".into(), 1.into());
        }
        if self.mutable_content {
            aps.insert("mutable-content".into(), 1.into());
        }

        let mut root = self.custom_data.clone();
        root.insert("aps".into(), Value::Object(aps));
        Value::Object(root)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FcmPriority {
    #[default]
    Normal,
    High,
}

impl FcmPriority {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// Body of an FCM HTTP v1 `messages:send` request, minus the target token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FcmPayload {
    title: Option<String>,
    body: Option<String>,
    image: Option<String>,
    data: BTreeMap<String, String>,
    priority: FcmPriority,
    ttl_secs: Option<u64>,
    collapse_key: Option<String>,
}

impl FcmPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_owned());
        self
    }

    #[must_use]
    pub fn set_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_owned());
        self
    }

    #[must_use]
    pub fn set_image(mut self, url: &str) -> Self {
        self.image = Some(url.to_owned());
        self
    }

    /// FCM only accepts string values in `data`.
    #[must_use]
    pub fn set_data(mut self, key: &str, value: &str) -> Self {
        self.data.insert(key.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub const fn set_priority(mut self, priority: FcmPriority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn set_time_to_live(mut self, secs: u64) -> Self {
        self.ttl_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn set_collapse_key(mut self, key: &str) -> Self {
        self.collapse_key = Some(key.to_owned());
        self
    }

    /// Builds the request body addressed to `token`.
    #[must_use]
    pub fn for_token(&self, token: &str) -> Value {
        let mut message = Map::new();
        message.insert("token".into(), token.into());

        let mut notification = Map::new();
        for (key, value) in [("title", &self.title), ("body", &self.body), ("image", &self.image)] {
            if let Some(value) = value {
                notification.insert(key.into(), value.as_str().into());
            }
        }
        if !notification.is_empty() {
            message.insert("notification".into(), Value::Object(notification));
        }

        if !self.data.is_empty() {
            message.insert("data".into(), json!(self.data));
        }

        let mut android = Map::new();
        android.insert("priority".into(), self.priority.as_str().into());
        if let Some(ttl) = self.ttl_secs {
            android.insert("ttl".into(), format!("{ttl}s").into());
        }
        if let Some(key) = &self.collapse_key {
            android.insert("collapse_key".into(), key.as_str().into());
        }
        message.insert("android".into(), Value::Object(android));

        json!({ "message": message })
    }
}

/// Body of a JPush v3 push request.
#[derive(Debug, Clone, PartialEq)]
pub struct JPushPayload {
    platform: String,
    registration_ids: Vec<String>,
    title: Option<String>,
    alert: Option<String>,
    sound: Option<String>,
    extras: Map<String, Value>,
    time_to_live: Option<u64>,
    apns_production: bool,
    third_party: bool,
}

impl Default for JPushPayload {
    fn default() -> Self {
        Self {
            platform: "all".to_owned(),
            registration_ids: Vec::new(),
            title: None,
            alert: None,
            sound: None,
            extras: Map::new(),
            time_to_live: None,
            apns_production: true,
            third_party: false,
        }
    }
}

impl JPushPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Vendor channel variant: the content travels in `notification_3rd` instead of `notification`.
    #[must_use]
    pub fn third_party() -> Self {
        Self { third_party: true, ..Self::default() }
    }

    #[must_use]
    pub fn set_platform(mut self, platform: &str) -> Self {
        platform.clone_into(&mut self.platform);
        self
    }

    #[must_use]
    pub fn set_registration_ids<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        self.registration_ids = ids.iter().map(|id| id.as_ref().to_owned()).collect();
        self
    }

    #[must_use]
    pub fn set_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_owned());
        self
    }

    #[must_use]
    pub fn set_alert(mut self, alert: &str) -> Self {
        self.alert = Some(alert.to_owned());
        self
    }

    #[must_use]
    pub fn set_sound(mut self, sound: &str) -> Self {
        self.sound = Some(sound.to_owned());
        self
    }

    #[must_use]
    pub fn set_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extras.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub const fn set_time_to_live(mut self, secs: u64) -> Self {
        self.time_to_live = Some(secs);
        self
    }

    #[must_use]
    pub const fn set_apns_production(mut self, production: bool) -> Self {
        self.apns_production = production;
        self
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        root.insert("platform".into(), self.platform.as_str().into());
        root.insert("audience".into(), json!({ "registration_id": self.registration_ids }));

        let mut options = Map::new();
        options.insert("apns_production".into(), self.apns_production.into());
        if let Some(ttl) = self.time_to_live {
            options.insert("time_to_live".into(), ttl.into());
        }
        root.insert("options".into(), Value::Object(options));

        if self.third_party {
            let mut third = Map::new();
            if let Some(title) = &self.title {
                third.insert("title".into(), title.as_str().into());
            }
            if let Some(alert) = &self.alert {
                third.insert("content".into(), alert.as_str().into());
            }
            if let Some(sound) = &self.sound {
                third.insert("sound".into(), sound.as_str().into());
            }
            if !self.extras.is_empty() {
                third.insert("extras".into(), Value::Object(self.extras.clone()));
            }
            root.insert("notification_3rd".into(), Value::Object(third));
            return Value::Object(root);
        }

        let mut android = Map::new();
        let mut ios = Map::new();
        if let Some(alert) = &self.alert {
            android.insert("alert".into(), alert.as_str().into());
            ios.insert("alert".into(), alert.as_str().into());
        }
        if let Some(title) = &self.title {
            android.insert("title".into(), title.as_str().into());
        }
        if let Some(sound) = &self.sound {
            ios.insert("sound".into(), sound.as_str().into());
        }
        if !self.extras.is_empty() {
            android.insert("extras".into(), Value::Object(self.extras.clone()));
            ios.insert("extras".into(), Value::Object(self.extras.clone()));
        }

        let mut notification = Map::new();
        if let Some(alert) = &self.alert {
            notification.insert("alert".into(), alert.as_str().into());
        }
        notification.insert("android".into(), Value::Object(android));
        notification.insert("ios".into(), Value::Object(ios));
        root.insert("notification".into(), Value::Object(notification));

        Value::Object(root)
    }
}
