use rtsp_auth::{
    Algorithm, AuthMethod, Challenge, Error, Method, Mismatch, Secret, Sender, Validator,
    ValidatorConfig,
};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const URL: &str = "rtsp://myhost/mypath";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fault {
    None,
    WrongUser,
    WrongPass,
    WrongUrl,
}

fn run(methods: &[AuthMethod], fault: Fault) -> rtsp_auth::Result<()> {
    let va = Validator::new("testuser", "testpass", methods).unwrap();
    let www_authenticate = va.generate_header();

    let se = Sender::new(
        &www_authenticate,
        if fault == Fault::WrongUser {
            "test1user"
        } else {
            "testuser"
        },
        if fault == Fault::WrongPass {
            "test1pass"
        } else {
            "testpass"
        },
    )
    .unwrap();

    let authorization = se.generate_header(
        Method::Announce,
        if fault == Fault::WrongUrl {
            "rtsp://myhost/my1path"
        } else {
            URL
        },
    );

    va.validate_header(&authorization, Method::Announce, URL)
}

#[test]
fn test_auth() {
    for methods in [
        &[AuthMethod::Basic][..],
        &[AuthMethod::Digest][..],
        &[AuthMethod::Basic, AuthMethod::Digest][..],
    ] {
        for fault in [Fault::None, Fault::WrongUser, Fault::WrongPass, Fault::WrongUrl] {
            // Basic carries no URL
            if fault == Fault::WrongUrl && methods == [AuthMethod::Basic] {
                continue;
            }

            let res = run(methods, fault);
            if fault == Fault::None {
                assert_eq!(res, Ok(()), "{:?}", methods);
            } else {
                assert!(
                    matches!(res, Err(Error::InvalidCredential(_))),
                    "{:?} {:?} -> {:?}",
                    methods,
                    fault,
                    res
                );
            }
        }
    }
}

#[test]
fn test_auth_vlc() {
    for (client_url, server_url) in [
        ("rtsp://myhost/mypath/", "rtsp://myhost/mypath/trackID=0"),
        (
            "rtsp://myhost/mypath/test?testing/",
            "rtsp://myhost/mypath/test?testing/trackID=0",
        ),
        ("rtsp://myhost/mypath/trackID=0", "rtsp://myhost/mypath/"),
    ] {
        let va = Validator::new(
            "testuser",
            "testpass",
            &[AuthMethod::Basic, AuthMethod::Digest],
        )
        .unwrap();

        let se = Sender::new(&va.generate_header(), "testuser", "testpass").unwrap();
        let authorization = se.generate_header(Method::Announce, client_url);

        assert_eq!(
            va.validate_header(&authorization, Method::Announce, server_url),
            Ok(())
        );
        assert_eq!(
            va.validate_header(&authorization, Method::Announce, "rtsp://myhost/other"),
            Err(Error::InvalidCredential(Mismatch::Url))
        );
    }
}

#[test]
fn test_auth_hashed_secret() {
    for (literal, algorithm) in [
        ("md5:Pqe5JXv1B70jPDHws9ssqQ==", Algorithm::Md5),
        (
            "sha256:gdaqTwb/+g0u4zQop6Gd8UD1WGlEkW+V0eNAh67GgaM=",
            Algorithm::Sha256,
        ),
    ] {
        for fault in [Fault::None, Fault::WrongUser, Fault::WrongPass] {
            let va = Validator::new(
                "testuser",
                literal,
                &[AuthMethod::Basic, AuthMethod::Digest],
            )
            .unwrap();
            assert_eq!(va.algorithm(), algorithm);

            let challenge = Challenge::decode(va.generate_header()).unwrap();

            for method in [AuthMethod::Basic, AuthMethod::Digest] {
                let se = Sender::with_methods(
                    &challenge,
                    if fault == Fault::WrongUser {
                        "test1user"
                    } else {
                        "testuser"
                    },
                    Secret::plain(if fault == Fault::WrongPass {
                        "test1pass"
                    } else {
                        "testpass"
                    }),
                    &[method],
                )
                .unwrap();

                let authorization = se.generate_header(Method::Announce, URL);
                let res = va.validate_header(&authorization, Method::Announce, URL);

                if fault == Fault::None {
                    assert_eq!(res, Ok(()), "{} {:?}", literal, method);
                } else {
                    assert!(matches!(res, Err(Error::InvalidCredential(_))));
                }
            }
        }
    }
}

#[test]
fn test_auth_hashed_credentials() {
    for fault in [Fault::None, Fault::WrongUser, Fault::WrongPass] {
        // sha256 of "testuser" and "testpass"
        let va = Validator::new(
            "sha256:rl3rgi4NcZkpAEcacZnQ2VuOfJ0FxAqCRaKB/SwdZoQ=",
            "sha256:E9JJ8stBJ7QM+nV4ZoUCeHk/gU3tPFh/5YieiJp6n2w=",
            &[AuthMethod::Basic, AuthMethod::Digest],
        )
        .unwrap();

        let se = Sender::new(
            &va.generate_header(),
            if fault == Fault::WrongUser {
                "test1user"
            } else {
                "testuser"
            },
            if fault == Fault::WrongPass {
                "test1pass"
            } else {
                "testpass"
            },
        )
        .unwrap();
        assert_eq!(se.method(), AuthMethod::Basic);

        let authorization = se.generate_header(Method::Announce, URL);
        let res = va.validate_header(&authorization, Method::Announce, URL);

        if fault == Fault::None {
            assert_eq!(res, Ok(()));
        } else {
            assert!(matches!(res, Err(Error::InvalidCredential(_))), "{:?}", fault);
        }
    }
}

#[test]
fn test_auth_root_not_reused() {
    let va = Validator::new("testuser", "testpass", &[AuthMethod::Digest]).unwrap();
    let se = Sender::new(&va.generate_header(), "testuser", "testpass").unwrap();
    let authorization = se.generate_header(Method::Describe, "rtsp://myhost/");

    assert_eq!(
        va.validate_header(&authorization, Method::Describe, "rtsp://myhost/secret"),
        Err(Error::InvalidCredential(Mismatch::Url))
    );
}

#[test]
fn test_method_independence() {
    let va = Validator::new(
        "testuser",
        "testpass",
        &[AuthMethod::Basic, AuthMethod::Digest],
    )
    .unwrap();
    let challenge = va.challenge();

    for method in [AuthMethod::Basic, AuthMethod::Digest] {
        let se = Sender::with_methods(&challenge, "testuser", Secret::plain("testpass"), &[method])
            .unwrap();
        assert_eq!(se.method(), method);

        let authorization = se.generate_header(Method::Setup, URL);
        assert_eq!(va.validate_header(&authorization, Method::Setup, URL), Ok(()));
    }
}

#[test]
fn test_sender_from_foreign_challenge() {
    // unknown schemes around a usable one are ignored
    let se = Sender::new(
        &[
            r#"Negotiate"#,
            r#"Digest realm="IPCAM", nonce="0123456789abcdef0123456789abcdef""#,
            r#"Bearer realm="x""#,
        ],
        "testuser",
        "testpass",
    )
    .unwrap();

    assert_eq!(se.method(), AuthMethod::Digest);
}

#[test]
fn test_concurrent_validation() {
    let va = std::sync::Arc::new(
        Validator::with_config(
            "testuser",
            Secret::plain("testpass"),
            ValidatorConfig::default(),
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap(),
    );
    let se = std::sync::Arc::new(
        Sender::new(&va.generate_header(), "testuser", "testpass").unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let va = va.clone();
            let se = se.clone();
            std::thread::spawn(move || {
                let url = format!("{}/trackID={}", URL, i);
                let authorization = se.generate_header(Method::Setup, &url);
                va.validate_header(&authorization, Method::Setup, &url)
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), Ok(()));
    }
}

fn methods_strategy() -> impl Strategy<Value = Vec<AuthMethod>> {
    prop_oneof![
        Just(vec![AuthMethod::Basic]),
        Just(vec![AuthMethod::Digest]),
        Just(vec![AuthMethod::Basic, AuthMethod::Digest]),
        Just(vec![AuthMethod::Digest, AuthMethod::Basic]),
    ]
}

proptest! {
    #[test]
    fn prop_round_trip(
        identity in "[a-zA-Z0-9_.@-]{1,16}",
        secret in "[ -~]{0,24}",
        path in "[a-zA-Z0-9/_=?.,:-]{0,24}",
        methods in methods_strategy(),
        seed in any::<u64>(),
    ) {
        let va = Validator::with_config(
            identity.clone(),
            Secret::plain(secret.clone()),
            ValidatorConfig { methods, ..ValidatorConfig::default() },
            &mut StdRng::seed_from_u64(seed),
        ).unwrap();

        let url = format!("rtsp://myhost/{}", path);
        let challenge = Challenge::decode(va.generate_header()).unwrap();
        let se = Sender::with_methods(
            &challenge,
            identity,
            Secret::plain(secret),
            &[AuthMethod::Digest, AuthMethod::Basic],
        ).unwrap();

        let authorization = se.generate_header(Method::Play, &url);
        prop_assert_eq!(va.validate_header(&authorization, Method::Play, &url), Ok(()));
    }

    #[test]
    fn prop_wrong_secret_rejected(
        secret in "[a-z]{1,12}",
        other in "[a-z]{1,12}",
        methods in methods_strategy(),
    ) {
        prop_assume!(secret != other);

        let va = Validator::new("testuser", &secret, &methods).unwrap();
        let se = Sender::new(&va.generate_header(), "testuser", &other).unwrap();

        let authorization = se.generate_header(Method::Play, URL);
        let res = va.validate_header(&authorization, Method::Play, URL);
        prop_assert!(matches!(res, Err(Error::InvalidCredential(_))));
    }
}
