use campus_api::UserRef;
use jsonwebtoken::errors::Error;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::configs::Auth;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub token: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub iat: u64,
    pub exp: u64,
}

impl TokenClaims {
    /// The caller as it is embedded in group documents.
    pub fn user(&self) -> UserRef {
        UserRef {
            id: self.sub.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TokenService {
    expiration: u64,
    secret: String,
}

impl TokenService {
    pub fn new(auth: Auth) -> Self {
        Self {
            expiration: auth.expiration,
            secret: auth.secret,
        }
    }

    pub fn retrieve_token_claims(&self, token: &str) -> Result<TokenData<TokenClaims>, Error> {
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
    }

    pub fn generate_token(&self, user: &UserRef) -> Result<Token, Error> {
        let iat = OffsetDateTime::now_utc().unix_timestamp().max(0) as u64;
        let exp = iat + self.expiration;

        let claims = TokenClaims {
            sub: user.id.clone(),
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            iat,
            exp,
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_ref());

        let token = encode(&Header::default(), &claims, &encoding_key)?;

        Ok(Token {
            id: claims.sub,
            token,
            iat,
            exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::errors::ErrorKind;

    use super::*;

    fn token_service() -> TokenService {
        TokenService::new(Auth {
            secret: String::from("test"),
            expiration: 1000,
        })
    }

    #[test]
    fn test_generate_and_retrieve_token() {
        let token_service = token_service();
        let user = UserRef {
            id: String::from("user-1"),
            name: String::from("Grace Hopper"),
            avatar: Some(String::from("https://example.com/grace.png")),
        };

        let token = token_service.generate_token(&user).unwrap();

        let claims = token_service
            .retrieve_token_claims(&token.token)
            .unwrap()
            .claims;

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.exp, claims.iat + 1000);
        assert_eq!(claims.user(), user);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let other = TokenService::new(Auth {
            secret: String::from("other"),
            expiration: 1000,
        });
        let user = UserRef {
            id: String::from("user-1"),
            name: String::from("Grace Hopper"),
            avatar: None,
        };

        let token = other.generate_token(&user).unwrap();
        let error = token_service()
            .retrieve_token_claims(&token.token)
            .unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::InvalidSignature));
    }
}
