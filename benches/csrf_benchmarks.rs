use criterion::{Criterion, criterion_group, criterion_main};
use http::{HeaderMap, HeaderValue, Method, header};
use signet::{
    CsrfConfig, CsrfMiddleware, CsrfRequest, CsrfResponse, Digest, TokenCodec, TokenOptions,
};
use std::collections::HashMap;
use std::hint::black_box;

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for digest in [Digest::Sha256, Digest::Sha384, Digest::Sha512] {
        let codec = TokenCodec::new(&TokenOptions {
            digest,
            ..TokenOptions::default()
        })
        .unwrap();
        let key = b"test_secret_key_32_bytes_long!!!";
        let token = codec.sign(key);

        group.bench_function(format!("sign_{}", digest), |b| {
            b.iter(|| codec.sign(black_box(key)))
        });

        group.bench_function(format!("verify_{}", digest), |b| {
            b.iter(|| codec.verify(black_box(key), black_box(&token)))
        });
    }

    group.finish();
}

fn bench_middleware(c: &mut Criterion) {
    let mut group = c.benchmark_group("middleware");

    let csrf = CsrfMiddleware::from_secret(
        "test_secret_key_32_bytes_long!!!",
        CsrfConfig::default().with_cookie_secure(false),
    )
    .unwrap();

    let mut request = CsrfRequest::new(Method::GET);
    let mut response = CsrfResponse::new();
    csrf.create(&mut request, &mut response);
    let secret = response.cookie("csrf").unwrap().value().to_string();
    let token = request.csrf_token().unwrap();

    group.bench_function("create_fresh", |b| {
        b.iter(|| {
            let mut request = CsrfRequest::new(Method::GET);
            let mut response = CsrfResponse::new();
            csrf.create(&mut request, &mut response);
            black_box(request.csrf_token())
        })
    });

    let cookies = HashMap::from([("csrf".to_string(), secret)]);

    group.bench_function("chain_post", |b| {
        b.iter(|| {
            let mut request = CsrfRequest::new(Method::POST)
                .with_cookies(cookies.clone())
                .with_form_body([("csrf", token.as_str())]);
            let mut response = CsrfResponse::new();
            black_box(csrf.chain(&mut request, &mut response))
        })
    });

    let mut headers = HeaderMap::new();
    headers.insert(header::HOST, HeaderValue::from_static("good.example:8443"));
    headers.insert(
        header::ORIGIN,
        HeaderValue::from_static("https://good.example:8443"),
    );
    let request = CsrfRequest::new(Method::POST).with_headers(headers);

    group.bench_function("check_origin", |b| {
        b.iter(|| csrf.check_origin(black_box(&request)))
    });

    group.finish();
}

criterion_group!(csrf_benches, bench_codec, bench_middleware);

criterion_main!(csrf_benches);
