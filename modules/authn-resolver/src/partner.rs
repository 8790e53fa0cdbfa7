//! Partner header authentication.
//!
//! Partner requests arrive with their transport identity already vetted by
//! the upstream mutual-TLS terminator; this component only checks the
//! internal consistency of the asserted headers. It is fully stateless and
//! creates no session.

use std::fmt;
use std::str::FromStr;

use gateway_errors::AuthError;
use gateway_security::{AuthContext, AuthType, ParseEnumError, Persona};
use http::HeaderMap;

/// Partner header names.
pub mod headers {
    pub const PERSONA: &str = "x-persona";
    pub const MEMBER_ID: &str = "x-member-id";
    pub const MEMBER_ID_TYPE: &str = "x-member-id-type";
    pub const PARTNER_ID: &str = "x-partner-id";
    pub const USER_ID: &str = "x-user-id";
}

/// Identity providers recognized as `X-Member-Id-Type` issuers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdpProvider {
    Ohid,
    PartnerSso,
}

impl IdpProvider {
    /// Fixed provider-to-persona consistency mapping: each provider vouches
    /// only for the personas it actually issues identities for.
    #[must_use]
    pub fn allowed_personas(self) -> &'static [Persona] {
        match self {
            Self::Ohid => &[Persona::CaseWorker],
            Self::PartnerSso => &[Persona::Agent, Persona::ConfigSpecialist],
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ohid => "OHID",
            Self::PartnerSso => "PARTNER_SSO",
        }
    }
}

impl fmt::Display for IdpProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdpProvider {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ohid" => Ok(Self::Ohid),
            "partner_sso" => Ok(Self::PartnerSso),
            _ => Err(ParseEnumError(s.to_owned())),
        }
    }
}

/// Stateless authenticator for partner-asserted identities.
#[derive(Debug, Clone, Default)]
pub struct PartnerHeaderAuthenticator;

impl PartnerHeaderAuthenticator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Whether the request is attempting partner authentication at all.
    ///
    /// Any of the required headers counts as an attempt, so an incomplete
    /// set fails with `MissingHeader` instead of `MissingCredential`.
    #[must_use]
    pub fn is_partner_request(headers: &HeaderMap) -> bool {
        [headers::PERSONA, headers::MEMBER_ID, headers::MEMBER_ID_TYPE]
            .iter()
            .any(|name| headers.contains_key(*name))
    }

    /// Authenticate the partner header set.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingHeader`] for an absent or blank required header
    /// - [`AuthError::InvalidEnumValue`] for an unparseable enum header
    /// - [`AuthError::IdpPersonaMismatch`] when the issuing provider does not
    ///   vouch for the asserted persona
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let persona_raw = required_header(headers, headers::PERSONA)?;
        let member_id = required_header(headers, headers::MEMBER_ID)?;
        let provider_raw = required_header(headers, headers::MEMBER_ID_TYPE)?;

        let persona: Persona = persona_raw.parse().map_err(|_| AuthError::InvalidEnumValue {
            header: headers::PERSONA.to_owned(),
            value: persona_raw.clone(),
        })?;
        let provider: IdpProvider =
            provider_raw.parse().map_err(|_| AuthError::InvalidEnumValue {
                header: headers::MEMBER_ID_TYPE.to_owned(),
                value: provider_raw.clone(),
            })?;

        if !provider.allowed_personas().contains(&persona) {
            return Err(AuthError::IdpPersonaMismatch {
                provider: provider.to_string(),
                persona,
            });
        }

        let mut builder = AuthContext::builder()
            .auth_type(AuthType::Proxy)
            .user_id(member_id.clone())
            .effective_member_id(member_id)
            .persona(persona);
        if let Some(partner_id) = optional_header(headers, headers::PARTNER_ID) {
            builder = builder.partner_id(partner_id);
        }
        if let Some(operator_id) = optional_header(headers, headers::USER_ID) {
            builder = builder.operator_id(operator_id);
        }
        builder
            .build()
            .map_err(|_| AuthError::MissingHeader {
                header: headers::MEMBER_ID.to_owned(),
            })
    }
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, AuthError> {
    optional_header(headers, name).ok_or_else(|| AuthError::MissingHeader {
        header: name.to_owned(),
    })
}

fn optional_header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn mixed_case_dashed_persona_parses() {
        let auth = PartnerHeaderAuthenticator::new();
        let ctx = auth
            .authenticate(&header_map(&[
                ("x-persona", "Case-Worker"),
                ("x-member-id", "member-42"),
                ("x-member-id-type", "OHID"),
            ]))
            .unwrap();
        assert_eq!(ctx.auth_type(), AuthType::Proxy);
        assert_eq!(ctx.persona(), Persona::CaseWorker);
        assert_eq!(ctx.effective_member_id(), "member-42");
        assert!(ctx.delegate_types().is_empty());
        assert!(ctx.session_id().is_none());
    }

    #[test]
    fn blank_header_reports_its_name() {
        let auth = PartnerHeaderAuthenticator::new();
        let err = auth
            .authenticate(&header_map(&[
                ("x-persona", "agent"),
                ("x-member-id", "  "),
                ("x-member-id-type", "PARTNER_SSO"),
            ]))
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::MissingHeader {
                header: "x-member-id".to_owned()
            }
        );
    }

    #[test]
    fn absent_header_reports_its_name() {
        let auth = PartnerHeaderAuthenticator::new();
        let err = auth
            .authenticate(&header_map(&[
                ("x-member-id", "member-42"),
                ("x-member-id-type", "OHID"),
            ]))
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::MissingHeader {
                header: "x-persona".to_owned()
            }
        );
    }

    #[test]
    fn invalid_enum_names_header_and_value() {
        let auth = PartnerHeaderAuthenticator::new();
        let err = auth
            .authenticate(&header_map(&[
                ("x-persona", "superuser"),
                ("x-member-id", "member-42"),
                ("x-member-id-type", "OHID"),
            ]))
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::InvalidEnumValue {
                header: "x-persona".to_owned(),
                value: "superuser".to_owned(),
            }
        );
    }

    #[test]
    fn provider_persona_mismatch_names_both() {
        let auth = PartnerHeaderAuthenticator::new();
        let err = auth
            .authenticate(&header_map(&[
                ("x-persona", "agent"),
                ("x-member-id", "member-42"),
                ("x-member-id-type", "OHID"),
            ]))
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::IdpPersonaMismatch {
                provider: "OHID".to_owned(),
                persona: Persona::Agent,
            }
        );
    }

    #[test]
    fn every_unmapped_pair_is_rejected() {
        let auth = PartnerHeaderAuthenticator::new();
        let providers = [IdpProvider::Ohid, IdpProvider::PartnerSso];
        let personas = [
            Persona::SelfService,
            Persona::Delegate,
            Persona::Agent,
            Persona::CaseWorker,
            Persona::ConfigSpecialist,
        ];
        for provider in providers {
            for persona in personas {
                let result = auth.authenticate(&header_map(&[
                    ("x-persona", persona.as_str()),
                    ("x-member-id", "member-42"),
                    ("x-member-id-type", provider.as_str()),
                ]));
                if provider.allowed_personas().contains(&persona) {
                    assert!(result.is_ok(), "{provider}/{persona} should pass");
                } else {
                    assert_eq!(
                        result.unwrap_err(),
                        AuthError::IdpPersonaMismatch {
                            provider: provider.to_string(),
                            persona,
                        },
                        "{provider}/{persona} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn optional_headers_are_captured() {
        let auth = PartnerHeaderAuthenticator::new();
        let ctx = auth
            .authenticate(&header_map(&[
                ("x-persona", "config_specialist"),
                ("x-member-id", "member-42"),
                ("x-member-id-type", "partner-sso"),
                ("x-partner-id", "partner-7"),
                ("x-user-id", "operator-99"),
            ]))
            .unwrap();
        assert_eq!(ctx.partner_id(), Some("partner-7"));
        assert_eq!(ctx.operator_id(), Some("operator-99"));
    }

    #[test]
    fn partner_request_detection_requires_only_one_header() {
        assert!(PartnerHeaderAuthenticator::is_partner_request(&header_map(
            &[("x-persona", "agent")]
        )));
        assert!(!PartnerHeaderAuthenticator::is_partner_request(
            &header_map(&[("x-partner-id", "partner-7")])
        ));
    }
}
