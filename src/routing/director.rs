//! Per-request retargeting.
//!
//! # Responsibilities
//! - Resolve the forwarded destination before anything is sent upstream
//! - Rewrite the request URI and `Host` to that destination
//! - Classify the resource and hand successful classifications to the
//!   analytics sink without waiting on it

use std::sync::Arc;

use axum::http::header::{ACCEPT, HOST, USER_AGENT};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Uri};
use url::Url;

use crate::analytics::EventSink;
use crate::observability::metrics;
use crate::routing::forwarded::{authority, forwarded_destination, ForwardedUrlError};
use crate::routing::resource::classify;

/// Rewrites inbound requests toward their forwarded destination.
pub struct Director {
    header: HeaderName,
    sink: Option<Arc<dyn EventSink>>,
}

impl Director {
    /// `sink` is `None` when analytics is disabled for the process.
    pub fn new(header: HeaderName, sink: Option<Arc<dyn EventSink>>) -> Self {
        Self { header, sink }
    }

    /// Retarget `parts` and report the request. Returns the upstream target.
    ///
    /// Only a bad forwarding header fails; classification problems are
    /// logged and never stop the request.
    pub fn direct(&self, parts: &mut Parts) -> Result<Url, ForwardedUrlError> {
        let target = forwarded_destination(&parts.headers, &self.header)?;

        parts.uri = target
            .as_str()
            .parse::<Uri>()
            .map_err(|_| ForwardedUrlError::Target(target.to_string()))?;
        let host = HeaderValue::from_str(&authority(&target))
            .map_err(|_| ForwardedUrlError::Target(target.to_string()))?;
        parts.headers.insert(HOST, host);

        let accept = parts.headers.get(ACCEPT).and_then(|v| v.to_str().ok());
        match classify(accept, &target) {
            Ok(classified) => {
                metrics::record_classification(classified.resource_type.extension());
                if let Some(sink) = &self.sink {
                    let user_agent = parts
                        .headers
                        .get(USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    sink.dispatch(classified.into_string(), user_agent);
                }
            }
            Err(e) => {
                metrics::record_classification("unsupported");
                tracing::debug!(error = %e, "Unable to compose resource url");
            }
        }

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<(String, String)>>,
    }

    impl EventSink for RecordingSink {
        fn dispatch(&self, endpoint: String, user_agent: String) {
            self.events.lock().unwrap().push((endpoint, user_agent));
        }
    }

    impl RecordingSink {
        fn events(&self) -> Vec<(String, String)> {
            self.events.lock().unwrap().clone()
        }
    }

    fn director(sink: Option<Arc<RecordingSink>>) -> Director {
        Director::new(
            HeaderName::from_static("x-cf-forwarded-url"),
            sink.map(|s| s as Arc<dyn EventSink>),
        )
    }

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("http://route-service.local/ignored");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap().into_parts().0
    }

    #[test]
    fn test_rewrites_target_and_host() {
        let mut parts = parts(&[
            ("X-Cf-Forwarded-Url", "https://data.example.com:8443/views/abc?limit=5"),
            ("Host", "route-service.local"),
        ]);

        let target = director(None).direct(&mut parts).unwrap();

        assert_eq!(target.as_str(), "https://data.example.com:8443/views/abc?limit=5");
        assert_eq!(parts.uri, "https://data.example.com:8443/views/abc?limit=5");
        assert_eq!(parts.headers[HOST], "data.example.com:8443");
    }

    #[test]
    fn test_dispatches_one_event_for_classified_request() {
        let sink = Arc::new(RecordingSink::default());
        let mut parts = parts(&[
            ("X-Cf-Forwarded-Url", "https://example.com/resource?sort=name"),
            ("Accept", "application/json"),
            ("User-Agent", "curl/8.0"),
        ]);

        director(Some(sink.clone())).direct(&mut parts).unwrap();

        assert_eq!(
            sink.events(),
            vec![(
                "https://example.com/resource.json".to_string(),
                "curl/8.0".to_string()
            )]
        );
        // The proxied request itself keeps its query and path.
        assert_eq!(parts.uri, "https://example.com/resource?sort=name");
    }

    #[test]
    fn test_unclassifiable_request_is_still_directed() {
        let sink = Arc::new(RecordingSink::default());
        let mut parts = parts(&[
            ("X-Cf-Forwarded-Url", "https://example.com/resource"),
            ("Accept", "image/png"),
        ]);

        let target = director(Some(sink.clone())).direct(&mut parts).unwrap();

        assert_eq!(target.as_str(), "https://example.com/resource");
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_missing_user_agent_is_empty() {
        let sink = Arc::new(RecordingSink::default());
        let mut parts = parts(&[("X-Cf-Forwarded-Url", "http://example.com/resource.csv")]);

        director(Some(sink.clone())).direct(&mut parts).unwrap();

        assert_eq!(
            sink.events(),
            vec![("http://example.com/resource.csv".to_string(), String::new())]
        );
    }

    #[test]
    fn test_bad_header_rejects_request_only() {
        let sink = Arc::new(RecordingSink::default());
        let director = director(Some(sink.clone()));

        let mut bad = parts(&[("X-Cf-Forwarded-Url", "not a url")]);
        assert!(director.direct(&mut bad).is_err());
        assert_eq!(bad.uri, "http://route-service.local/ignored");

        let mut missing = parts(&[("Accept", "application/json")]);
        assert!(matches!(
            director.direct(&mut missing),
            Err(ForwardedUrlError::Missing(_))
        ));

        let mut good = parts(&[("X-Cf-Forwarded-Url", "https://example.com/r.json")]);
        assert!(director.direct(&mut good).is_ok());
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_without_sink_nothing_is_reported() {
        let director = director(None);

        let mut parts = parts(&[
            ("X-Cf-Forwarded-Url", "https://example.com/resource"),
            ("Accept", "application/json"),
        ]);
        assert!(director.direct(&mut parts).is_ok());
    }
}
