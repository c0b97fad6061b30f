// Diesel schema for shopcrawl tables.
// Kept in sync by hand with repository/schema_sqlite.sql and schema_postgres.sql.

diesel::table! {
    videos (video_id) {
        video_id -> Text,
        author -> Text,
        caption -> Text,
        views -> BigInt,
        likes -> BigInt,
        shares -> BigInt,
        comments -> BigInt,
        play_url -> Nullable<Text>,
        cover_url -> Nullable<Text>,
        duration -> Nullable<BigInt>,
        aspect_ratio -> Text,
        posted_at -> Nullable<Text>,
        has_shop -> Bool,
        product_id -> Nullable<Text>,
        product_name -> Nullable<Text>,
        product_image -> Nullable<Text>,
        product_price -> Nullable<Text>,
        shop_name -> Nullable<Text>,
        source -> Text,
        first_seen_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    product_cache (product_id) {
        product_id -> Text,
        name -> Text,
        image -> Text,
        price -> Text,
        shop_name -> Text,
        fetched_at -> Text,
    }
}

diesel::table! {
    product_blacklist (product_id) {
        product_id -> Text,
        reason -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    handles (username) {
        username -> Text,
        status -> Text,
        discovery_source -> Text,
        last_scraped -> Nullable<Text>,
        total_videos -> BigInt,
        shop_videos -> BigInt,
        shop_ratio -> Double,
        no_shop_streak -> Integer,
        no_posts_streak -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    scrape_history (id) {
        id -> Integer,
        username -> Text,
        videos_found -> Integer,
        shop_videos_found -> Integer,
        success -> Bool,
        error -> Nullable<Text>,
        status -> Text,
        scraped_at -> Text,
    }
}

diesel::table! {
    raw_pages (id) {
        id -> Integer,
        tag -> Text,
        page_offset -> BigInt,
        payload -> Text,
        fetched_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    videos,
    product_cache,
    product_blacklist,
    handles,
    scrape_history,
    raw_pages,
);
