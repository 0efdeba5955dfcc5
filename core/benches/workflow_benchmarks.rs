// benches/workflow_benchmarks.rs
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lustre::auth::RoleCache;
use lustre::memory::MemoryStore;
use lustre::model::{Address, PaymentMethod, Product};
use lustre::sandbox::{SandboxCarrier, SandboxGateway, SandboxPush};
use lustre::{AdminRole, Backends, CheckoutRequest, Commerce, PaymentRouter, StoreSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use uuid::Uuid;

struct Fixture {
  store: Arc<MemoryStore>,
  commerce: Commerce,
  customer: Uuid,
  address_id: Uuid,
  product: Uuid,
}

fn fixture(line_count: usize) -> Fixture {
  let store = Arc::new(MemoryStore::new());
  let backends = Backends::from_store(
    store.clone(),
    Arc::new(SandboxCarrier::new(12_000)),
    Arc::new(SandboxPush::new()),
  );
  let payments = PaymentRouter::new(Arc::new(SandboxGateway::new("key_bench", "bench-secret")), None);
  let commerce = Commerce::new(backends, StoreSettings::default(), payments);

  let customer = Uuid::new_v4();
  let address_id = Uuid::new_v4();
  store.add_address(Address {
    id: address_id,
    user_id: customer,
    full_name: "Bench Customer".to_string(),
    phone: "+919800000000".to_string(),
    line1: "1 Residency Road".to_string(),
    line2: None,
    city: "Bengaluru".to_string(),
    state: "Karnataka".to_string(),
    pincode: "560025".to_string(),
    country: "IN".to_string(),
  });

  let mut product = Uuid::nil();
  for i in 0..line_count {
    product = Uuid::new_v4();
    store.add_product(Product {
      id: product,
      name: format!("Bench Pendant {i}"),
      price: 250_000,
      stock_quantity: i32::MAX,
      weight_grams: 12,
      image_url: None,
      huid: None,
      is_active: true,
    });
  }

  Fixture {
    store,
    commerce,
    customer,
    address_id,
    product,
  }
}

fn request(f: &Fixture, payment_method: PaymentMethod) -> CheckoutRequest {
  CheckoutRequest {
    user_id: f.customer,
    address_id: f.address_id,
    payment_method,
    gift_wrap: true,
    gift_message: Some("Happy anniversary".to_string()),
    coupon_code: None,
    client_discount: None,
    delivery_time_slot: None,
  }
}

fn bench_checkout(c: &mut Criterion) {
  let mut group = c.benchmark_group("Checkout");
  let rt = Runtime::new().unwrap();

  for quantity in [1u32, 5, 20].iter() {
    let f = fixture(1);
    group.throughput(Throughput::Elements(1));
    group.bench_with_input(BenchmarkId::new("cod_units", quantity), quantity, |b, &qty| {
      b.to_async(&rt).iter(|| async {
        f.store.add_to_cart(f.customer, f.product, qty as i32, None);
        f.commerce.create_order(request(&f, PaymentMethod::Cod)).await.unwrap();
      });
    });
  }

  let f = fixture(1);
  group.bench_function("online_initiate", |b| {
    b.to_async(&rt).iter(|| async {
      f.store.add_to_cart(f.customer, f.product, 1, Some("14"));
      let order = f.commerce.create_order(request(&f, PaymentMethod::Online)).await.unwrap();
      f.commerce.initiate_payment(f.customer, order.id).await.unwrap();
    });
  });

  group.finish();
}

fn bench_role_resolution(c: &mut Criterion) {
  let mut group = c.benchmark_group("RoleResolution");
  let rt = Runtime::new().unwrap();

  let f = fixture(1);
  let admin = Uuid::new_v4();
  f.store.grant_role(admin, AdminRole::SupportAdmin);

  group.bench_function("cached_gate", |b| {
    b.to_async(&rt).iter(|| async {
      f.commerce.principal(admin).await.unwrap();
    });
  });

  let cache = RoleCache::new(Duration::from_secs(60), 4096);
  let ids: Vec<Uuid> = (0..4096).map(|_| Uuid::new_v4()).collect();
  for id in &ids {
    cache.put(*id, Some(AdminRole::Staff));
  }
  group.throughput(Throughput::Elements(ids.len() as u64));
  group.bench_function("cache_hits", |b| {
    b.iter(|| {
      for id in &ids {
        criterion::black_box(cache.get(*id));
      }
    });
  });

  group.finish();
}

criterion_group!(benches, bench_checkout, bench_role_resolution);
criterion_main!(benches);
